use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Ссылка на окно хоста
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowRef {
    pub id: String,
    pub title: String,
}

impl WindowRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for WindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.title, self.id)
    }
}

/// Запущенное приложение, как его видит хост.
///
/// Владелец - хост; здесь только снимок на момент перечисления.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningApp {
    pub id: String,
    pub name: String,
    pub windows: Vec<WindowRef>,
    /// Путь к .desktop файлу, ключ поиска правила закрытия
    pub descriptor: Option<PathBuf>,
}

impl RunningApp {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            windows: Vec::new(),
            descriptor: None,
        }
    }

    pub fn with_window(mut self, window: WindowRef) -> Self {
        self.windows.push(window);
        self
    }

    pub fn with_descriptor(mut self, path: impl Into<PathBuf>) -> Self {
        self.descriptor = Some(path.into());
        self
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn descriptor(&self) -> Option<&Path> {
        self.descriptor.as_deref()
    }

    pub fn has_window(&self, window: &WindowRef) -> bool {
        self.windows.iter().any(|w| w.id == window.id)
    }
}

impl fmt::Display for RunningApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_app_creation() {
        let app = RunningApp::new("org.gnome.Terminal.desktop", "Terminal")
            .with_window(WindowRef::new("0x1", "bash"))
            .with_window(WindowRef::new("0x2", "vim"))
            .with_descriptor("/usr/share/applications/org.gnome.Terminal.desktop");

        assert_eq!(app.window_count(), 2);
        assert_eq!(
            app.descriptor(),
            Some(Path::new("/usr/share/applications/org.gnome.Terminal.desktop"))
        );
        assert_eq!(app.to_string(), "Terminal (org.gnome.Terminal.desktop)");
    }

    #[test]
    fn test_has_window_compares_ids() {
        let app = RunningApp::new("a.desktop", "A").with_window(WindowRef::new("0x1", "old title"));

        assert!(app.has_window(&WindowRef::new("0x1", "new title")));
        assert!(!app.has_window(&WindowRef::new("0x2", "old title")));
    }
}
