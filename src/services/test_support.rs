//! Test support: recording fakes of the host, injector and overview.
//! All fakes append to one shared event log so tests can assert global ordering.

use crate::config::Config;
use crate::error::{CloseError, Result};
use crate::events::{KeySegment, RunningApp, WindowRef};
use crate::rules::JsonRuleStore;
use crate::services::host::ShellHost;
use crate::services::injector::{command_args, KeyInjector};
use crate::services::overview::Overview;
use crate::services::{SessionCloser, ShortcutReplayEngine, WindowTracker};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ReleaseWorkspaces,
    Activate(String, String),
    Inject(String),
    Quit(String),
    OverviewHide,
    OverviewHidden,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub struct FakeHost {
    apps: Vec<RunningApp>,
    focused: Option<String>,
    log: EventLog,
}

#[async_trait::async_trait]
impl ShellHost for FakeHost {
    async fn running_apps(&self) -> Result<Vec<RunningApp>> {
        Ok(self.apps.clone())
    }

    async fn focused_app(&self) -> Result<Option<RunningApp>> {
        Ok(self
            .focused
            .as_ref()
            .and_then(|id| self.apps.iter().find(|a| &a.id == id).cloned()))
    }

    async fn activate_window(&self, app: &RunningApp, window: &WindowRef) -> Result<()> {
        self.log
            .lock()
            .push(Event::Activate(app.id.clone(), window.id.clone()));
        Ok(())
    }

    async fn request_quit(&self, app: &RunningApp) -> Result<()> {
        self.log.lock().push(Event::Quit(app.id.clone()));
        Ok(())
    }

    async fn release_workspaces(&self) -> Result<()> {
        self.log.lock().push(Event::ReleaseWorkspaces);
        Ok(())
    }
}

/// Injector that fails on the listed call indices (0-based, across all apps)
pub struct FakeInjector {
    fail_on: HashSet<usize>,
    calls: Mutex<usize>,
    log: EventLog,
}

#[async_trait::async_trait]
impl KeyInjector for FakeInjector {
    async fn send(&self, segment: &KeySegment, key_delay: Duration) -> Result<String> {
        tokio::task::yield_now().await;

        let index = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls - 1
        };
        let cmdline = format!("tool {}", command_args(segment, key_delay).join(" "));
        self.log.lock().push(Event::Inject(cmdline));

        if self.fail_on.contains(&index) {
            Err(CloseError::Injection {
                program: "tool".into(),
                output: format!("call {} failed", index),
            })
        } else {
            Ok(format!("call {} ok", index))
        }
    }

    fn program(&self) -> &str {
        "tool"
    }
}

pub struct FakeOverview {
    visible: Arc<watch::Sender<bool>>,
    auto_hide: bool,
    log: EventLog,
}

#[async_trait::async_trait]
impl Overview for FakeOverview {
    async fn is_visible(&self) -> Result<bool> {
        Ok(*self.visible.borrow())
    }

    async fn hide(&self) -> Result<()> {
        self.log.lock().push(Event::OverviewHide);
        if self.auto_hide {
            let visible = Arc::clone(&self.visible);
            let log = Arc::clone(&self.log);
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                log.lock().push(Event::OverviewHidden);
                visible.send_replace(false);
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }
}

pub struct TestBed {
    pub apps: Vec<RunningApp>,
    pub tracker: Arc<WindowTracker>,
    log: EventLog,
    focused: Option<String>,
    fail_on: HashSet<usize>,
    overview_visible: bool,
    overview_auto_hide: bool,
}

impl TestBed {
    pub fn new(apps: Vec<RunningApp>) -> Self {
        Self {
            apps,
            tracker: Arc::new(WindowTracker::new()),
            log: Arc::new(Mutex::new(Vec::new())),
            focused: None,
            fail_on: HashSet::new(),
            overview_visible: false,
            overview_auto_hide: true,
        }
    }

    /// `<name>.desktop` with descriptor `/apps/<name>.desktop` and `windows` windows
    pub fn app(name: &str, windows: usize) -> RunningApp {
        (0..windows).fold(
            RunningApp::new(format!("{}.desktop", name), name)
                .with_descriptor(format!("/apps/{}.desktop", name)),
            |app, i| {
                app.with_window(WindowRef::new(
                    format!("{}-{}", name, i),
                    format!("{} window {}", name, i),
                ))
            },
        )
    }

    pub fn failing_injections(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.iter().copied().collect();
        self
    }

    pub fn overview_visible(mut self, auto_hide: bool) -> Self {
        self.overview_visible = true;
        self.overview_auto_hide = auto_hide;
        self
    }

    pub fn focused(mut self, app_id: &str) -> Self {
        self.focused = Some(app_id.to_string());
        self
    }

    fn host(&self) -> Arc<FakeHost> {
        Arc::new(FakeHost {
            apps: self.apps.clone(),
            focused: self.focused.clone(),
            log: Arc::clone(&self.log),
        })
    }

    fn injector(&self) -> Arc<FakeInjector> {
        Arc::new(FakeInjector {
            fail_on: self.fail_on.clone(),
            calls: Mutex::new(0),
            log: Arc::clone(&self.log),
        })
    }

    pub fn engine(&self) -> ShortcutReplayEngine {
        ShortcutReplayEngine::new(self.host(), self.injector(), Arc::clone(&self.tracker))
    }

    pub fn closer(&self, config: Config, rules: &str) -> SessionCloser {
        self.closer_with_injector(config, rules, self.injector())
    }

    /// Closer driving a real injector; only host and overview calls are recorded
    pub fn closer_with_injector(
        &self,
        config: Config,
        rules: &str,
        injector: Arc<dyn KeyInjector>,
    ) -> SessionCloser {
        let (visible, _) = watch::channel(self.overview_visible);
        let overview = Arc::new(FakeOverview {
            visible: Arc::new(visible),
            auto_hide: self.overview_auto_hide,
            log: Arc::clone(&self.log),
        });
        SessionCloser::new(
            Arc::new(config),
            self.host(),
            overview,
            injector,
            Arc::clone(&self.tracker),
            JsonRuleStore::from_text(rules),
        )
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().clone()
    }

    pub fn injections(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Inject(cmdline) => Some(cmdline),
                _ => None,
            })
            .collect()
    }

    pub fn quits(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Quit(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

/// Executable that ignores its arguments and never exits on its own
pub fn hanging_program(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("session-close-bin-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexec sleep 30\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
