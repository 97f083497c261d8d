use crate::config::Config;
use crate::error::{CloseError, Result};
use crate::events::{RunningApp, WindowRef};
use crate::services::WindowTracker;
use std::sync::Arc;

/// Capabilities the close pipeline needs from the windowing host
#[async_trait::async_trait]
pub trait ShellHost: Send + Sync {
    /// Running applications in host enumeration order
    async fn running_apps(&self) -> Result<Vec<RunningApp>>;

    /// Application owning the focused window, if any
    async fn focused_app(&self) -> Result<Option<RunningApp>>;

    /// Focus and raise a window
    async fn activate_window(&self, app: &RunningApp, window: &WindowRef) -> Result<()>;

    /// Ask an application to quit
    async fn request_quit(&self, app: &RunningApp) -> Result<()>;

    /// Make every workspace non-persistent so empty ones can be reclaimed
    async fn release_workspaces(&self) -> Result<()>;
}

/// Factory function to create an appropriate host backend based on the dry_run flag
pub fn create_shell_host(
    config: Arc<Config>,
    tracker: Arc<WindowTracker>,
    dry_run: bool,
) -> Result<Arc<dyn ShellHost>> {
    if dry_run {
        return Ok(Arc::new(super::dry_run::DryRunHost::new()));
    }

    match config.host.backend.as_str() {
        "wmctrl" => Ok(Arc::new(super::wmctrl::WmctrlHost::new(tracker))),
        other => Err(CloseError::ServiceUnavailable(format!(
            "неизвестный backend хоста: {}",
            other
        ))),
    }
}
