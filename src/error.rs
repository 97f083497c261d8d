use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloseError {
    #[error("Ошибка разбора правил закрытия: {0}")]
    ConfigParse(String),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Не удалось отправить клавиши ({program}): {output}")]
    Injection { program: String, output: String },

    #[error("{program} не завершился за {timeout:?}")]
    InjectionTimeout { program: String, timeout: Duration },

    #[error("У приложения нет открытых окон: {0}")]
    NoWindow(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl CloseError {
    pub fn no_window<T>(app: impl Into<String>) -> Result<T> {
        Err(CloseError::NoWindow(app.into()))
    }

    /// Ошибки внешнего процесса ввода: приложение закрывается обычным способом
    pub fn is_injection_failure(&self) -> bool {
        matches!(
            self,
            CloseError::Injection { .. } | CloseError::InjectionTimeout { .. }
        )
    }
}

impl From<serde_json::Error> for CloseError {
    fn from(e: serde_json::Error) -> Self {
        CloseError::ConfigParse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CloseError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! close_error {
    (config_parse, $($arg:tt)*) => {
        $crate::error::CloseError::ConfigParse(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::CloseError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::CloseError::Internal(format!($($arg)*))
    };
}
