use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use std::sync::Arc;
mod config;
mod error;
mod events;
mod rules;
mod services;
mod utils;

use config::Config;
use rules::JsonRuleStore;
use services::{
    create_key_injector,
    create_overview,
    create_shell_host,
    SessionCloser,
    WindowTracker,
};

#[derive(Parser, Debug)]
#[command(name = "session-close")]
#[command(about = "Закрытие всех окон сессии с воспроизведением сочетаний клавиш по правилам")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "session-close.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Закрыть только приложение с указанным идентификатором
    #[arg(long, conflicts_with = "current")]
    app: Option<String>,

    /// Закрыть только приложение с фокусом
    #[arg(long)]
    current: bool,

    /// Показать, как будут закрыты приложения, и выйти
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level)?;

    info!("Запуск session-close v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    } else if config.rules.enabled {
        // Проверка окружения для ydotool
        utils::permissions::check_permissions(&config.injector.program);
    }

    let rules = JsonRuleStore::from_path(&config.rules.path);
    match rules.load() {
        Ok(set) => info!("Загружено правил: {} ({:?})", set.len(), config.rules.path),
        Err(e) => warn!("Не удалось прочитать правила {:?}: {}", config.rules.path, e),
    }

    let tracker = Arc::new(WindowTracker::new());
    let host = create_shell_host(config.clone(), tracker.clone(), args.dry_run)?;
    let overview = create_overview(config.clone(), args.dry_run).await;
    let injector = create_key_injector(config.clone(), args.dry_run);

    let closer = SessionCloser::new(config.clone(), host, overview, injector, tracker, rules);
    info!("Все компоненты инициализированы");

    if args.list {
        let queue = closer.plan().await?;
        for (app, rule) in &queue.rule_closing {
            info!("{}: сочетания {}", app, rule.shortcuts().join(" "));
        }
        for app in &queue.normal_closing {
            if closer.should_skip(app) {
                info!("{}: пропуск (несколько окон)", app);
            } else {
                info!("{}: запрос завершения", app);
            }
        }
        return Ok(());
    }

    let report = if args.current || args.app.is_some() {
        closer.close_app(args.app.as_deref()).await
    } else {
        closer.close_all().await
    };

    info!("Готово: {}", report.summary());
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
