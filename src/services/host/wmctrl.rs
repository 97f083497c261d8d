use crate::error::{CloseError, Result};
use crate::events::{RunningApp, WindowRef};
use crate::services::WindowTracker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::r#trait::ShellHost;

/// Хост на базе wmctrl/xprop (X11 и XWayland)
pub struct WmctrlHost {
    tracker: Arc<WindowTracker>,
    application_dirs: Vec<PathBuf>,
}

/// Строка вывода `wmctrl -lpx`
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListedWindow {
    id: String,
    desktop: i64,
    pid: u32,
    wm_class: String,
    title: String,
}

impl WmctrlHost {
    pub fn new(tracker: Arc<WindowTracker>) -> Self {
        let application_dirs = Self::application_dirs();
        debug!("Каталоги .desktop файлов: {:?}", application_dirs);
        Self {
            tracker,
            application_dirs,
        }
    }

    fn application_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        match std::env::var("XDG_DATA_HOME") {
            Ok(home) if !home.is_empty() => dirs.push(PathBuf::from(home)),
            _ => {
                if let Ok(home) = std::env::var("HOME") {
                    dirs.push(Path::new(&home).join(".local/share"));
                }
            }
        }

        let data_dirs = std::env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        dirs.extend(data_dirs.split(':').filter(|d| !d.is_empty()).map(PathBuf::from));

        dirs.into_iter().map(|d| d.join("applications")).collect()
    }

    async fn run(program: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| CloseError::ServiceUnavailable(format!("{} не найден: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CloseError::Internal(format!(
                "{} вернул ошибку: {}",
                program,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn list_apps(&self) -> Result<Vec<RunningApp>> {
        let stdout = Self::run("wmctrl", &["-lpx"]).await?;
        let windows: Vec<ListedWindow> = stdout.lines().filter_map(parse_window_line).collect();
        debug!("wmctrl вернул {} окон", windows.len());
        Ok(group_apps(&windows, |wm_class| {
            find_descriptor(&self.application_dirs, wm_class)
        }))
    }

    async fn active_window_id(&self) -> Option<u64> {
        match Self::run("xprop", &["-root", "_NET_ACTIVE_WINDOW"]).await {
            Ok(stdout) => parse_active_window(&stdout),
            Err(e) => {
                debug!("Не удалось получить активное окно через xprop: {}", e);
                None
            }
        }
    }

    fn find_focused(apps: &[RunningApp], active: u64) -> Option<(&RunningApp, &WindowRef)> {
        apps.iter().find_map(|app| {
            app.windows
                .iter()
                .find(|w| parse_window_id(&w.id) == Some(active))
                .map(|w| (app, w))
        })
    }
}

#[async_trait::async_trait]
impl ShellHost for WmctrlHost {
    async fn running_apps(&self) -> Result<Vec<RunningApp>> {
        let apps = self.list_apps().await?;

        // Фокус на момент перечисления попадает в историю активаций
        if let Some(active) = self.active_window_id().await {
            if let Some((app, window)) = Self::find_focused(&apps, active) {
                self.tracker.record_activation(&app.id, window);
            }
        }

        info!("Найдено запущенных приложений: {}", apps.len());
        Ok(apps)
    }

    async fn focused_app(&self) -> Result<Option<RunningApp>> {
        let apps = self.list_apps().await?;
        let Some(active) = self.active_window_id().await else {
            return Ok(None);
        };
        Ok(Self::find_focused(&apps, active).map(|(app, window)| {
            self.tracker.record_activation(&app.id, window);
            app.clone()
        }))
    }

    async fn activate_window(&self, app: &RunningApp, window: &WindowRef) -> Result<()> {
        debug!("wmctrl: активируем окно {} приложения {}", window, app.name);
        Self::run("wmctrl", &["-ia", &window.id]).await?;
        Ok(())
    }

    async fn request_quit(&self, app: &RunningApp) -> Result<()> {
        let mut failures = Vec::new();
        for window in &app.windows {
            if let Err(e) = Self::run("wmctrl", &["-ic", &window.id]).await {
                warn!("Не удалось закрыть окно {} приложения {}: {}", window, app.name, e);
                failures.push(window.id.clone());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CloseError::Internal(format!(
                "не закрыты окна {} приложения {}",
                failures.join(", "),
                app.name
            )))
        }
    }

    async fn release_workspaces(&self) -> Result<()> {
        // В X11 пустые рабочие столы не удерживаются оконным менеджером
        debug!("wmctrl: освобождение рабочих столов не требуется");
        Ok(())
    }
}

fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], &s[end..])),
        None => Some((s, "")),
    }
}

/// `0x03a00003  0 4242   gnome-terminal-server.Gnome-terminal  host  Title`
fn parse_window_line(line: &str) -> Option<ListedWindow> {
    let (id, rest) = next_field(line)?;
    let (desktop, rest) = next_field(rest)?;
    let (pid, rest) = next_field(rest)?;
    let (wm_class, rest) = next_field(rest)?;
    let (_machine, rest) = next_field(rest)?;

    Some(ListedWindow {
        id: id.to_string(),
        desktop: desktop.parse().ok()?,
        pid: pid.parse().unwrap_or(0),
        wm_class: wm_class.to_string(),
        title: rest.trim().to_string(),
    })
}

fn parse_window_id(id: &str) -> Option<u64> {
    let hex = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X"))?;
    u64::from_str_radix(hex, 16).ok()
}

/// `_NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00003`
fn parse_active_window(stdout: &str) -> Option<u64> {
    let (_, id) = stdout.trim().rsplit_once('#')?;
    parse_window_id(id.trim()).filter(|&id| id != 0)
}

/// Разделить WM_CLASS `instance.Class`. Точки бывают и внутри частей,
/// поэтому сначала ищем разбиение на две равные (без учёта регистра) половины.
fn split_wm_class(wm_class: &str) -> (&str, &str) {
    let mut first_split = None;
    for (i, _) in wm_class.match_indices('.') {
        let (instance, class) = (&wm_class[..i], &wm_class[i + 1..]);
        if instance.eq_ignore_ascii_case(class) {
            return (instance, class);
        }
        first_split.get_or_insert((instance, class));
    }
    first_split.unwrap_or((wm_class, wm_class))
}

fn find_descriptor(dirs: &[PathBuf], wm_class: &str) -> Option<PathBuf> {
    let (instance, class) = split_wm_class(wm_class);
    let mut candidates = vec![
        class.to_string(),
        instance.to_string(),
        class.to_lowercase(),
        instance.to_lowercase(),
    ];
    candidates.dedup();

    dirs.iter()
        .flat_map(|dir| {
            candidates
                .iter()
                .map(move |name| dir.join(format!("{}.desktop", name)))
        })
        .find(|path| path.is_file())
        .or_else(|| find_by_startup_class(dirs, instance, class))
}

/// Поиск по `StartupWMClass=`: имя .desktop файла часто не совпадает с WM_CLASS
/// (`org.gnome.Terminal.desktop` для `gnome-terminal-server.Gnome-terminal`)
fn find_by_startup_class(dirs: &[PathBuf], instance: &str, class: &str) -> Option<PathBuf> {
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "desktop"))
            .collect();
        files.sort();

        let found = files.into_iter().find(|path| {
            startup_wm_class(path).is_some_and(|startup| {
                startup.eq_ignore_ascii_case(class) || startup.eq_ignore_ascii_case(instance)
            })
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

fn startup_wm_class(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    text.lines()
        .find_map(|line| line.trim().strip_prefix("StartupWMClass="))
        .map(|value| value.trim().to_string())
}

fn group_apps<F>(windows: &[ListedWindow], resolve: F) -> Vec<RunningApp>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let mut apps: Vec<(String, RunningApp)> = Vec::new();

    // Окна на всех рабочих столах (-1) - панели и рабочий стол
    for window in windows.iter().filter(|w| w.desktop >= 0) {
        let window_ref = WindowRef::new(window.id.clone(), window.title.clone());
        if let Some((_, app)) = apps.iter_mut().find(|(class, _)| *class == window.wm_class) {
            app.windows.push(window_ref);
            continue;
        }

        let (_, class) = split_wm_class(&window.wm_class);
        let app = match resolve(&window.wm_class) {
            Some(path) => {
                let id = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("{}.desktop", class.to_lowercase()));
                RunningApp::new(id, class).with_descriptor(path)
            }
            None => RunningApp::new(format!("{}.desktop", class.to_lowercase()), class),
        };
        crate::debug_if_enabled!("Приложение {} (pid {})", app, window.pid);
        apps.push((window.wm_class.clone(), app.with_window(window_ref)));
    }

    apps.into_iter().map(|(_, app)| app).collect()
}
