use crate::events::{KeySegment, ModifierMask};
use crate::rules::ShortcutStep;
use evdev::KeyCode;
use once_cell::sync::Lazy;
use smallvec::SmallVec;

/// Разница между кодами Xorg и кодами ядра Linux.
/// См. https://wiki.archlinux.org/title/Keyboard_input#Identifying_keycodes_in_Xorg
pub const XORG_KEYCODE_OFFSET: i32 = 8;

/// Трансляция сочетаний из пространства GDK/Xorg в коды input-event-codes.h
pub struct KeycodeMap;

// Порядок модификаторов фиксирован: Shift, Control, Alt, Meta
static MODIFIER_CODES: Lazy<[(u32, i32); 4]> = Lazy::new(|| {
    [
        (ModifierMask::SHIFT, i32::from(KeyCode::KEY_LEFTSHIFT.code())),
        (ModifierMask::CONTROL, i32::from(KeyCode::KEY_LEFTCTRL.code())),
        (ModifierMask::ALT, i32::from(KeyCode::KEY_LEFTALT.code())),
        (ModifierMask::META, i32::from(KeyCode::KEY_LEFTMETA.code())),
    ]
});

impl KeycodeMap {
    /// Коды клавиш аккорда: модификаторы по порядку, затем `keycode - 8`.
    /// Отрицательный результат не проверяется.
    pub fn translate(mask: ModifierMask, keycode: i32) -> SmallVec<[i32; 5]> {
        let mut codes: SmallVec<[i32; 5]> = MODIFIER_CODES
            .iter()
            .filter(|(bit, _)| mask.contains(*bit))
            .map(|&(_, code)| code)
            .collect();
        codes.push(keycode - XORG_KEYCODE_OFFSET);
        codes
    }

    pub fn segment_for(step: &ShortcutStep) -> KeySegment {
        let codes = Self::translate(step.state, step.keycode);
        KeySegment::from_chord(&codes, step.shortcut.clone())
    }
}
