use crate::error::Result;
use tokio::sync::watch;
use tracing::debug;

use super::r#trait::Overview;

/// Обзор без хоста: всегда скрыт
pub struct StaticOverview {
    visible: watch::Sender<bool>,
}

impl StaticOverview {
    pub fn hidden() -> Self {
        let (visible, _) = watch::channel(false);
        Self { visible }
    }
}

#[async_trait::async_trait]
impl Overview for StaticOverview {
    async fn is_visible(&self) -> Result<bool> {
        Ok(*self.visible.borrow())
    }

    async fn hide(&self) -> Result<()> {
        debug!("Обзор уже скрыт");
        self.visible.send_replace(false);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_overview_is_hidden() {
        let overview = StaticOverview::hidden();
        assert!(!overview.is_visible().await.unwrap());

        let rx = overview.subscribe();
        overview.hide().await.unwrap();
        assert!(!*rx.borrow());
    }
}
