use crate::config::Config;
use crate::error::{CloseError, Result};
use crate::events::RunningApp;
use crate::rules::{JsonRuleStore, RuleKind};
use crate::services::host::ShellHost;
use crate::services::injector::KeyInjector;
use crate::services::overview::Overview;
use crate::services::partitioner::{partition, ClosureQueue};
use crate::services::replay::{ReplayOutcome, ShortcutReplayEngine};
use crate::services::WindowTracker;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Что произошло с каждым приложением (идентификаторы)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseReport {
    pub closed_by_rules: Vec<String>,
    /// Воспроизведение не удалось, приложение закрывалось обычным способом
    pub fell_back: Vec<String>,
    pub quit_requested: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl CloseReport {
    pub fn summary(&self) -> String {
        format!(
            "по правилам: {}, с откатом: {}, запрос завершения: {}, пропущено: {}, ошибок: {}",
            self.closed_by_rules.len(),
            self.fell_back.len(),
            self.quit_requested.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// Закрытие сессии: сначала приложения с правилами (по одному), затем остальные
pub struct SessionCloser {
    config: Arc<Config>,
    host: Arc<dyn ShellHost>,
    overview: Arc<dyn Overview>,
    rules: JsonRuleStore,
    engine: ShortcutReplayEngine,
}

impl SessionCloser {
    pub fn new(
        config: Arc<Config>,
        host: Arc<dyn ShellHost>,
        overview: Arc<dyn Overview>,
        injector: Arc<dyn KeyInjector>,
        tracker: Arc<WindowTracker>,
        rules: JsonRuleStore,
    ) -> Self {
        let engine = ShortcutReplayEngine::new(Arc::clone(&host), injector, tracker);
        Self {
            config,
            host,
            overview,
            rules,
            engine,
        }
    }

    /// Закрыть все запущенные приложения. Ошибки не выходят наружу.
    pub async fn close_all(&self) -> CloseReport {
        info!("Закрываем открытые окна");

        if let Err(e) = self.host.release_workspaces().await {
            warn!("Не удалось освободить рабочие столы: {}", e);
        }

        match self.host.running_apps().await {
            Ok(apps) => self.close_apps(apps).await,
            Err(e) => {
                error!("Не удалось получить список приложений: {}", e);
                CloseReport::default()
            }
        }
    }

    /// Закрыть одно приложение по идентификатору или приложение с фокусом
    pub async fn close_app(&self, app_id: Option<&str>) -> CloseReport {
        match self.find_app(app_id).await {
            Ok(app) => {
                info!("Закрываем текущее приложение {}", app);
                self.close_apps(vec![app]).await
            }
            Err(e) => {
                error!("{}", e);
                CloseReport::default()
            }
        }
    }

    /// Как будут закрыты приложения, без действий
    pub async fn plan(&self) -> Result<ClosureQueue> {
        let apps = self.host.running_apps().await?;
        partition(apps, self.config.rules.enabled, &self.rules)
    }

    async fn find_app(&self, app_id: Option<&str>) -> Result<RunningApp> {
        let found = match app_id {
            Some(id) => self
                .host
                .running_apps()
                .await?
                .into_iter()
                .find(|app| app.id == id),
            None => self.host.focused_app().await?,
        };
        found.ok_or_else(|| {
            CloseError::ServiceUnavailable(format!(
                "приложение не найдено: {}",
                app_id.unwrap_or("<фокус>")
            ))
        })
    }

    async fn close_apps(&self, apps: Vec<RunningApp>) -> CloseReport {
        let mut report = CloseReport::default();

        let mut queue = match partition(apps.clone(), self.config.rules.enabled, &self.rules) {
            Ok(queue) => queue,
            Err(e) => {
                warn!(
                    "Правила закрытия недоступны ({}), все приложения закрываются обычным способом",
                    e
                );
                ClosureQueue::all_normal(apps)
            }
        };

        debug!(
            "По правилам: {}, обычным способом: {}",
            queue.rule_closing.len(),
            queue.normal_closing.len()
        );

        // Клавиши должны попасть в окно приложения, а не в обзор
        if !queue.rule_closing.is_empty() {
            self.leave_overview().await;
        }

        while let Some((app, rule)) = queue.rule_closing.pop_front() {
            if rule.kind != RuleKind::Shortcut {
                warn!("Неизвестный тип правила для {}, закрываем обычным способом", app);
                self.close_one(&app, &mut report).await;
                continue;
            }

            match self.engine.replay(&app, &rule).await {
                ReplayOutcome::Completed { segments } => {
                    info!("{} закрыто по правилу ({} сегментов)", app, segments);
                    report.closed_by_rules.push(app.id.clone());
                }
                ReplayOutcome::Failed { sent, error } => {
                    if error.is_injection_failure() {
                        info!(
                            "Откат к обычному закрытию {} после {} сегментов: {}",
                            app, sent, error
                        );
                    } else {
                        error!("Воспроизведение для {} прервано: {}", app, error);
                    }
                    report.fell_back.push(app.id.clone());
                    self.close_one(&app, &mut report).await;
                }
            }
        }

        for app in &queue.normal_closing {
            self.close_one(app, &mut report).await;
        }

        info!("Закрытие завершено: {}", report.summary());
        report
    }

    async fn leave_overview(&self) {
        match self.overview.is_visible().await {
            Ok(false) => return,
            Ok(true) => {}
            Err(e) => {
                warn!("Не удалось узнать состояние обзора: {}", e);
                return;
            }
        }

        let mut visibility = self.overview.subscribe();
        if let Err(e) = self.overview.hide().await {
            warn!("Не удалось скрыть обзор: {}", e);
            return;
        }

        let limit = self.config.overview.hide_timeout();
        let hidden = tokio::time::timeout(limit, visibility.wait_for(|visible| !*visible))
            .await
            .map(|changed| changed.map(|_| ()));

        match hidden {
            Ok(Ok(())) => debug!("Обзор скрыт"),
            Ok(Err(_)) => warn!("Обзор перестал сообщать о состоянии, продолжаем"),
            Err(_) => warn!("Обзор не скрылся за {:?}, продолжаем", limit),
        }
    }

    async fn close_one(&self, app: &RunningApp, report: &mut CloseReport) {
        if self.should_skip(app) {
            debug!("Пропускаем {}: открыто окон: {}", app, app.window_count());
            report.skipped.push(app.id.clone());
            return;
        }

        debug!("Закрываем {}", app);
        match self.host.request_quit(app).await {
            Ok(()) => report.quit_requested.push(app.id.clone()),
            Err(e) => {
                warn!("Не удалось закрыть {}: {}", app, e);
                report.failed.push(app.id.clone());
            }
        }
    }

    /// Приложения с несколькими окнами не закрываются, кроме белого списка
    pub fn should_skip(&self, app: &RunningApp) -> bool {
        if !self.config.close.skip_multiple_windows || app.window_count() <= 1 {
            return false;
        }
        if self.config.is_whitelisted(&app.id) {
            debug!("{} в белом списке, закрываем", app);
            return false;
        }
        true
    }
}
