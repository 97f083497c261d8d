use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Host-provided modal window-switching UI that must not hold input focus
/// while synthetic keys are injected.
#[async_trait::async_trait]
pub trait Overview: Send + Sync {
    async fn is_visible(&self) -> Result<bool>;

    /// Request the overview to hide. The hidden transition is reported through
    /// [`Overview::subscribe`], not by this call.
    async fn hide(&self) -> Result<()>;

    /// Visibility updates; `false` once the overview is hidden
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Factory function to create an overview backend. A GNOME Shell that cannot be
/// reached degrades to an always-hidden overview.
pub async fn create_overview(config: Arc<Config>, dry_run: bool) -> Arc<dyn Overview> {
    if dry_run || config.overview.backend == "none" {
        return Arc::new(super::dry_run::StaticOverview::hidden());
    }

    match super::gnome::GnomeShellOverview::connect().await {
        Ok(overview) => Arc::new(overview),
        Err(e) => {
            warn!("Обзор GNOME Shell недоступен: {}. Считаем, что он скрыт", e);
            Arc::new(super::dry_run::StaticOverview::hidden())
        }
    }
}
