use crate::config::Config;
use crate::events::KeySegment;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// External input injection: one invocation per key segment.
///
/// The injection protocol has no window targeting; keys go to whatever window
/// currently holds input focus.
#[async_trait::async_trait]
pub trait KeyInjector: Send + Sync {
    /// Send one segment, resolving with the captured process output on success
    async fn send(&self, segment: &KeySegment, key_delay: Duration) -> Result<String>;

    fn program(&self) -> &str;
}

/// `key --key-delay <N> <code:state>...`
pub fn command_args(segment: &KeySegment, key_delay: Duration) -> Vec<String> {
    let mut args = vec![
        "key".to_string(),
        "--key-delay".to_string(),
        key_delay.as_millis().to_string(),
    ];
    args.extend(segment.args());
    args
}

/// Factory function to create an appropriate injector based on the dry_run flag
pub fn create_key_injector(config: Arc<Config>, dry_run: bool) -> Arc<dyn KeyInjector> {
    if dry_run {
        Arc::new(super::dry_run::DryRunInjector::new(&config.injector.program))
    } else {
        Arc::new(super::ydotool::YdotoolInjector::new(
            &config.injector.program,
            config.injector.timeout(),
        ))
    }
}
