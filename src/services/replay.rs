use crate::error::{CloseError, Result};
use crate::events::{KeySegment, RunningApp, WindowRef};
use crate::rules::CloseRule;
use crate::services::host::ShellHost;
use crate::services::injector::{command_args, KeyInjector};
use crate::services::keycode_map::KeycodeMap;
use crate::services::WindowTracker;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Сегменты, ещё не отправленные одному приложению
#[derive(Debug, Clone)]
pub struct PendingSegments {
    segments: VecDeque<KeySegment>,
    shortcuts: Vec<String>,
    key_delay: Duration,
}

impl PendingSegments {
    pub fn from_rule(rule: &CloseRule) -> Self {
        Self {
            segments: rule.value.iter().map(KeycodeMap::segment_for).collect(),
            shortcuts: rule.shortcuts().into_iter().map(str::to_string).collect(),
            key_delay: rule.key_delay(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Итог воспроизведения для одного приложения
#[derive(Debug)]
pub enum ReplayOutcome {
    Completed { segments: usize },
    /// Остальные сегменты отброшены, приложение закрывается обычным способом
    Failed { sent: usize, error: CloseError },
}

impl ReplayOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ReplayOutcome::Completed { .. })
    }
}

#[derive(Debug)]
enum ReplayState {
    ActivatingWindow,
    SendingSegment(KeySegment),
    Done,
    Failed(CloseError),
}

/// Последовательно воспроизводит сочетания закрытия для одного приложения.
/// Одновременно выполняется не больше одного воспроизведения: вызывающий ждёт
/// завершения `replay` перед следующим приложением.
pub struct ShortcutReplayEngine {
    host: Arc<dyn ShellHost>,
    injector: Arc<dyn KeyInjector>,
    tracker: Arc<WindowTracker>,
}

impl ShortcutReplayEngine {
    pub fn new(
        host: Arc<dyn ShellHost>,
        injector: Arc<dyn KeyInjector>,
        tracker: Arc<WindowTracker>,
    ) -> Self {
        Self {
            host,
            injector,
            tracker,
        }
    }

    pub async fn replay(&self, app: &RunningApp, rule: &CloseRule) -> ReplayOutcome {
        let mut pending = PendingSegments::from_rule(rule);
        let total = pending.len();
        let mut sent = 0;

        info!(
            "Закрываем {} сочетаниями: {} ({} сегментов)",
            app,
            pending.shortcuts.join(" "),
            total
        );
        if pending.is_empty() {
            debug!("Правило для {} не содержит сочетаний", app.name);
        }

        let mut state = ReplayState::ActivatingWindow;
        loop {
            state = match state {
                ReplayState::ActivatingWindow => {
                    if let Err(e) = self.activate_target(app).await {
                        warn!("{}", e);
                    }
                    Self::next_segment(&mut pending)
                }
                ReplayState::SendingSegment(segment) => {
                    info!(
                        "Отправляем {} {} ({}) приложению {}",
                        self.injector.program(),
                        command_args(&segment, pending.key_delay).join(" "),
                        segment.shortcut,
                        app.name
                    );
                    match self.injector.send(&segment, pending.key_delay).await {
                        Ok(output) => {
                            sent += 1;
                            info!(
                                "Клавиши для {} отправлены ({}/{}). output: {}",
                                app.name, sent, total, output
                            );
                            Self::next_segment(&mut pending)
                        }
                        Err(e) => ReplayState::Failed(e),
                    }
                }
                ReplayState::Done => return ReplayOutcome::Completed { segments: sent },
                ReplayState::Failed(error) => {
                    warn!(
                        "Не удалось отправить клавиши для {}: {}. Пропущено сегментов: {}",
                        app.name,
                        error,
                        pending.len()
                    );
                    return ReplayOutcome::Failed { sent, error };
                }
            };
        }
    }

    fn next_segment(pending: &mut PendingSegments) -> ReplayState {
        match pending.segments.pop_front() {
            Some(segment) => ReplayState::SendingSegment(segment),
            None => ReplayState::Done,
        }
    }

    /// Ввод уходит в окно с фокусом, поэтому сначала активируем последнее
    /// активное окно приложения, иначе первое.
    async fn activate_target(&self, app: &RunningApp) -> Result<()> {
        let window = match self.pick_window(app) {
            Some(window) => window,
            None => return CloseError::no_window(app.to_string()),
        };

        info!("Активируем окно {} приложения {}", window, app.name);
        self.host.activate_window(app, &window).await?;
        self.tracker.record_activation(&app.id, &window);
        Ok(())
    }

    fn pick_window(&self, app: &RunningApp) -> Option<WindowRef> {
        if let Some(window) = self.tracker.latest_alive(app) {
            debug!("Найдено отслеживаемое окно {} для {}", window, app.name);
            return Some(window);
        }
        app.windows.first().cloned()
    }
}
