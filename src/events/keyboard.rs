use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Состояние клавиши в протоколе ydotool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
}

impl KeyState {
    pub fn value(&self) -> u8 {
        match self {
            KeyState::Pressed => 1,
            KeyState::Released => 0,
        }
    }
}

/// Один токен `<код>:<1|0>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyToken {
    pub code: i32,
    pub state: KeyState,
}

impl KeyToken {
    pub fn press(code: i32) -> Self {
        Self {
            code,
            state: KeyState::Pressed,
        }
    }

    pub fn release(code: i32) -> Self {
        Self {
            code,
            state: KeyState::Released,
        }
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.code, self.state.value())
    }
}

/// Битовая маска модификаторов GDK, как она сохранена в правилах
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierMask(pub u32);

impl ModifierMask {
    pub const SHIFT: u32 = 1 << 0;
    pub const CONTROL: u32 = 1 << 2;
    pub const ALT: u32 = 1 << 3;
    pub const META: u32 = 1 << 28;

    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_shift(self, on: bool) -> Self {
        self.with_bit(Self::SHIFT, on)
    }

    #[allow(dead_code)]
    pub fn with_ctrl(self, on: bool) -> Self {
        self.with_bit(Self::CONTROL, on)
    }

    #[allow(dead_code)]
    pub fn with_alt(self, on: bool) -> Self {
        self.with_bit(Self::ALT, on)
    }

    #[allow(dead_code)]
    pub fn with_meta(self, on: bool) -> Self {
        self.with_bit(Self::META, on)
    }

    fn with_bit(mut self, bit: u32, on: bool) -> Self {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
        self
    }

    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.to_vec().is_empty()
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.contains(Self::SHIFT) { result.push("shift"); }
        if self.contains(Self::CONTROL) { result.push("ctrl"); }
        if self.contains(Self::ALT) { result.push("alt"); }
        if self.contains(Self::META) { result.push("meta"); }
        result
    }
}

impl fmt::Display for ModifierMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Последовательность токенов для одного аккорда: нажать все клавиши по порядку,
/// затем отпустить их в обратном порядке.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySegment {
    pub tokens: SmallVec<[KeyToken; 10]>,
    /// Исходное сочетание, только для логов
    pub shortcut: String,
}

impl KeySegment {
    pub fn from_chord(codes: &[i32], shortcut: impl Into<String>) -> Self {
        let tokens = codes
            .iter()
            .map(|&code| KeyToken::press(code))
            .chain(codes.iter().rev().map(|&code| KeyToken::release(code)))
            .collect();

        Self {
            tokens,
            shortcut: shortcut.into(),
        }
    }

    pub fn args(&self) -> Vec<String> {
        self.tokens.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}
