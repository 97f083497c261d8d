use crate::error::Result;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use zbus::Connection;

use super::r#trait::Overview;

#[zbus::proxy(
    interface = "org.gnome.Shell",
    default_service = "org.gnome.Shell",
    default_path = "/org/gnome/Shell"
)]
trait Shell {
    #[zbus(property)]
    fn overview_active(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn set_overview_active(&self, value: bool) -> zbus::Result<()>;
}

/// Обзор GNOME Shell через свойство `OverviewActive` на шине сессии
pub struct GnomeShellOverview {
    proxy: ShellProxy<'static>,
    visible: Arc<watch::Sender<bool>>,
}

impl GnomeShellOverview {
    pub async fn connect() -> Result<Self> {
        info!("Подключение к GNOME Shell через D-Bus");

        let connection = Connection::session().await?;
        let proxy = ShellProxy::new(&connection).await?;
        let initial = proxy.overview_active().await?;
        debug!("OverviewActive = {}", initial);

        let (visible, _) = watch::channel(initial);
        let overview = Self {
            proxy,
            visible: Arc::new(visible),
        };
        overview.spawn_watcher().await;
        Ok(overview)
    }

    /// Переносит изменения свойства в watch-канал
    async fn spawn_watcher(&self) {
        let mut changes = self.proxy.receive_overview_active_changed().await;
        let visible = Arc::clone(&self.visible);

        tokio::spawn(async move {
            while let Some(change) = changes.next().await {
                match change.get().await {
                    Ok(active) => {
                        debug!("OverviewActive изменилось: {}", active);
                        visible.send_replace(active);
                    }
                    Err(e) => warn!("Не удалось прочитать OverviewActive: {}", e),
                }
            }
            debug!("Поток изменений OverviewActive завершён");
        });
    }
}

#[async_trait::async_trait]
impl Overview for GnomeShellOverview {
    async fn is_visible(&self) -> Result<bool> {
        Ok(self.proxy.overview_active().await?)
    }

    async fn hide(&self) -> Result<()> {
        info!("Скрываем обзор GNOME Shell");
        self.proxy.set_overview_active(false).await?;
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }
}
