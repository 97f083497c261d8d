use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub rules: RulesConfig,
    pub close: CloseConfig,
    pub injector: InjectorConfig,
    pub overview: OverviewConfig,
    pub host: HostConfig,
    // Индекс белого списка - не сериализуется, строится после загрузки
    #[serde(skip)]
    whitelist_set: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RulesConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloseConfig {
    pub skip_multiple_windows: bool,
    /// Приложения, которые безопасно закрывать даже с несколькими окнами
    pub whitelist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InjectorConfig {
    pub program: String,
    /// 0 - без ограничения
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverviewConfig {
    pub backend: String,
    pub hide_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    pub backend: String,
}

impl InjectorConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl OverviewConfig {
    pub fn hide_timeout(&self) -> Duration {
        Duration::from_millis(self.hide_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            rules: RulesConfig {
                enabled: true,
                path: PathBuf::from("close-windows-rules.json"),
            },
            close: CloseConfig {
                skip_multiple_windows: true,
                whitelist: vec![
                    "org.gnome.Terminal.desktop".to_string(),
                    "org.gnome.Nautilus.desktop".to_string(),
                    "smplayer.desktop".to_string(),
                ],
            },
            injector: InjectorConfig {
                program: "ydotool".to_string(),
                timeout_ms: 10_000,
            },
            overview: OverviewConfig {
                backend: "gnome".to_string(),
                hide_timeout_ms: 2_000,
            },
            host: HostConfig {
                backend: "wmctrl".to_string(),
            },
            whitelist_set: HashSet::new(),
        };
        config.build_indexes();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SESSION_CLOSE_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_indexes();

        Ok(config)
    }

    pub fn build_indexes(&mut self) {
        self.whitelist_set = self.close.whitelist.iter().cloned().collect();
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        if self.injector.program.trim().is_empty() {
            anyhow::bail!("injector.program не может быть пустым");
        }

        match self.overview.backend.as_str() {
            "gnome" | "none" => {}
            _ => anyhow::bail!("Неверный backend обзора: {}", self.overview.backend),
        }

        match self.host.backend.as_str() {
            "wmctrl" => {}
            _ => anyhow::bail!("Неверный backend хоста: {}", self.host.backend),
        }

        for (i, app_id) in self.close.whitelist.iter().enumerate() {
            if app_id.trim().is_empty() {
                anyhow::bail!("Пустой идентификатор в белом списке #{}", i + 1);
            }
        }

        Ok(())
    }

    pub fn is_whitelisted(&self, app_id: &str) -> bool {
        self.whitelist_set.contains(app_id)
    }
}
