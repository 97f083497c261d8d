use crate::error::Result;
use crate::events::KeySegment;
use std::time::Duration;
use tracing::info;

use super::r#trait::{command_args, KeyInjector};

pub struct DryRunInjector {
    program: String,
}

impl DryRunInjector {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl KeyInjector for DryRunInjector {
    async fn send(&self, segment: &KeySegment, key_delay: Duration) -> Result<String> {
        info!(
            "[DRY RUN] {} {} ({})",
            self.program,
            command_args(segment, key_delay).join(" "),
            segment.shortcut
        );
        Ok(String::new())
    }

    fn program(&self) -> &str {
        &self.program
    }
}
