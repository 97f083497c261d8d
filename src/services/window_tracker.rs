use crate::events::{RunningApp, WindowRef};
use dashmap::DashMap;

/// WindowTracker remembers which windows of each application were activated, in order.
///
/// Responsibilities (strict):
/// - Record activations reported by the host or performed by the replay engine.
/// - Answer "most recently active window that still exists" for an application.
/// - Do NOT decide how applications are closed.
#[derive(Debug, Default)]
pub struct WindowTracker {
    // app id -> окна в порядке активации, последнее - самое свежее
    windows: DashMap<String, Vec<WindowRef>>,
}

impl WindowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_activation(&self, app_id: &str, window: &WindowRef) {
        let mut entry = self.windows.entry(app_id.to_string()).or_default();
        entry.retain(|w| w.id != window.id);
        entry.push(window.clone());
    }

    /// Последнее активированное окно приложения, которое ещё открыто.
    /// Закрытые окна удаляются из истории.
    pub fn latest_alive(&self, app: &RunningApp) -> Option<WindowRef> {
        let mut entry = self.windows.get_mut(&app.id)?;
        entry.retain(|w| app.has_window(w));
        entry.last().cloned()
    }
}
