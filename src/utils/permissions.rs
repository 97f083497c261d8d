use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Проверить окружение для отправки клавиш. Только предупреждения:
/// без ydotool приложения с правилами закрываются обычным способом.
pub fn check_permissions(program: &str) -> Vec<String> {
    info!("Проверка окружения для {}...", program);

    let mut problems = Vec::new();
    if let Err(problem) = check_program(program) {
        problems.push(problem);
    }
    if let Err(problem) = check_uinput_access() {
        problems.push(problem);
    }
    if let Err(problem) = check_daemon_socket() {
        problems.push(problem);
    }

    for problem in &problems {
        warn!("{}", problem);
    }
    if problems.is_empty() {
        info!("Проверка окружения завершена успешно");
    }
    problems
}

fn find_in_path(program: &str, path_var: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    path_var
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(program))
        .find(|path| is_executable(path))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn check_program(program: &str) -> Result<(), String> {
    let path_var = std::env::var("PATH").unwrap_or_default();
    match find_in_path(program, &path_var) {
        Some(path) => {
            info!("{} найден: {:?}", program, path);
            Ok(())
        }
        None => Err(format!("{} не найден в PATH", program)),
    }
}

fn check_uinput_access() -> Result<(), String> {
    let uinput_device = "/dev/uinput";

    if !Path::new(uinput_device).exists() {
        return Err(format!(
            "{} не существует, возможно модуль uinput не загружен",
            uinput_device
        ));
    }

    match fs::metadata(uinput_device) {
        Ok(metadata) => {
            let mode = metadata.permissions().mode();

            // Проверяем права доступа (обычно 660 или 666)
            if mode & 0o006 == 0 && mode & 0o060 == 0 {
                return Err(format!(
                    "Нет прав доступа к {}. Добавьте пользователя в группу 'input'",
                    uinput_device
                ));
            }

            info!("Доступ к {} подтвержден", uinput_device);
            Ok(())
        }
        Err(e) => Err(format!(
            "Не удалось проверить права доступа к {}: {}",
            uinput_device, e
        )),
    }
}

/// Сокет ydotoold: YDOTOOL_SOCKET, затем $XDG_RUNTIME_DIR/.ydotool_socket, затем /tmp
fn daemon_socket_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(socket) = std::env::var("YDOTOOL_SOCKET") {
        candidates.push(PathBuf::from(socket));
    }
    if let Ok(runtime) = std::env::var("XDG_RUNTIME_DIR") {
        candidates.push(Path::new(&runtime).join(".ydotool_socket"));
    }
    candidates.push(PathBuf::from("/tmp/.ydotool_socket"));
    candidates
}

fn check_daemon_socket() -> Result<(), String> {
    let candidates = daemon_socket_candidates();
    match candidates.iter().find(|path| path.exists()) {
        Some(path) => {
            info!("Сокет ydotoold: {:?}", path);
            Ok(())
        }
        None => Err(format!(
            "Сокет ydotoold не найден ({:?}). Запустите: systemctl --user start ydotoold",
            candidates
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_in_path() {
        assert!(find_in_path("sh", "/nonexistent:/bin:/usr/bin").is_some());
        assert!(find_in_path("sh", "/nonexistent").is_none());
        assert!(find_in_path("definitely-not-a-program", "/bin:/usr/bin").is_none());
    }

    #[test]
    fn test_absolute_program_path() {
        assert!(find_in_path("/bin/sh", "").is_some());
        assert!(find_in_path("/nonexistent/ydotool", "/bin").is_none());
    }

    #[test]
    fn test_socket_candidates_end_with_tmp() {
        let candidates = daemon_socket_candidates();
        assert_eq!(candidates.last(), Some(&PathBuf::from("/tmp/.ydotool_socket")));
    }
}
