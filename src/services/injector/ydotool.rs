use crate::error::{CloseError, Result};
use crate::events::KeySegment;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::r#trait::{command_args, KeyInjector};

/// Отправка клавиш через ydotool: новый процесс на каждый сегмент
pub struct YdotoolInjector {
    program: String,
    timeout: Option<Duration>,
}

impl YdotoolInjector {
    pub fn new(program: &str, timeout: Option<Duration>) -> Self {
        Self {
            program: program.to_string(),
            timeout,
        }
    }

    fn collect_output(output: &Output) -> String {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        [stdout.trim(), stderr.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait::async_trait]
impl KeyInjector for YdotoolInjector {
    async fn send(&self, segment: &KeySegment, key_delay: Duration) -> Result<String> {
        let args = command_args(segment, key_delay);
        debug!("Запуск: {} {}", self.program, args.join(" "));

        // kill_on_drop: при таймауте процесс завершается вместе с future
        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                CloseError::InjectionTimeout {
                    program: self.program.clone(),
                    timeout: limit,
                }
            })?,
            None => output.await,
        };

        let output = output.map_err(|e| CloseError::Injection {
            program: self.program.clone(),
            output: format!("не удалось запустить: {}", e),
        })?;

        let text = Self::collect_output(&output);
        if output.status.success() {
            Ok(text)
        } else {
            Err(CloseError::Injection {
                program: self.program.clone(),
                output: format!("{} {}", output.status, text).trim().to_string(),
            })
        }
    }

    fn program(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> KeySegment {
        KeySegment::from_chord(&[42, 16], "<Shift>q")
    }

    #[tokio::test]
    async fn zero_exit_is_success() {
        let injector = YdotoolInjector::new("true", Some(Duration::from_secs(5)));
        assert!(injector.send(&segment(), Duration::ZERO).await.is_ok());
    }

    #[tokio::test]
    async fn non_zero_exit_is_injection_failure() {
        let injector = YdotoolInjector::new("false", None);
        let err = injector.send(&segment(), Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, CloseError::Injection { .. }));
    }

    #[tokio::test]
    async fn hung_process_is_killed_after_timeout() {
        let program = crate::services::test_support::hanging_program("hang-injector");
        let limit = Duration::from_millis(200);
        let injector = YdotoolInjector::new(&program.to_string_lossy(), Some(limit));

        let started = std::time::Instant::now();
        let err = injector.send(&segment(), Duration::ZERO).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(err.is_injection_failure());
        match err {
            CloseError::InjectionTimeout { timeout, .. } => assert_eq!(timeout, limit),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_program_is_injection_failure() {
        let injector = YdotoolInjector::new("/nonexistent/ydotool", None);
        let err = injector.send(&segment(), Duration::ZERO).await.unwrap_err();
        assert!(err.is_injection_failure());
    }
}
