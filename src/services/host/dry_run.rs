use crate::error::Result;
use crate::events::{RunningApp, WindowRef};
use tracing::info;

use super::r#trait::ShellHost;

/// Хост-заглушка: фиксированный набор приложений, действия только логируются
pub struct DryRunHost {
    apps: Vec<RunningApp>,
}

impl DryRunHost {
    pub fn new() -> Self {
        let apps = vec![
            RunningApp::new("org.gnome.Terminal.desktop", "Terminal - dry_run")
                .with_window(WindowRef::new("0x01", "bash"))
                .with_window(WindowRef::new("0x02", "htop"))
                .with_descriptor("/usr/share/applications/org.gnome.Terminal.desktop"),
            RunningApp::new("firefox.desktop", "Browser - dry_run")
                .with_window(WindowRef::new("0x03", "Mozilla Firefox"))
                .with_descriptor("/usr/share/applications/firefox.desktop"),
            RunningApp::new("code.desktop", "Editor - dry_run")
                .with_window(WindowRef::new("0x04", "main.rs"))
                .with_window(WindowRef::new("0x05", "lib.rs"))
                .with_descriptor("/usr/share/applications/code.desktop"),
        ];
        Self { apps }
    }
}

#[async_trait::async_trait]
impl ShellHost for DryRunHost {
    async fn running_apps(&self) -> Result<Vec<RunningApp>> {
        info!("Dry-run: эмулируем {} запущенных приложений", self.apps.len());
        Ok(self.apps.clone())
    }

    async fn focused_app(&self) -> Result<Option<RunningApp>> {
        Ok(self.apps.first().cloned())
    }

    async fn activate_window(&self, app: &RunningApp, window: &WindowRef) -> Result<()> {
        info!("[DRY RUN] Активация окна {} приложения {}", window, app);
        Ok(())
    }

    async fn request_quit(&self, app: &RunningApp) -> Result<()> {
        info!("[DRY RUN] Запрос завершения {}", app);
        Ok(())
    }

    async fn release_workspaces(&self) -> Result<()> {
        info!("[DRY RUN] Рабочие столы помечены как непостоянные");
        Ok(())
    }
}
