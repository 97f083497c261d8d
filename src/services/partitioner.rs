use crate::error::Result;
use crate::events::RunningApp;
use crate::rules::{CloseRule, JsonRuleStore};
use std::collections::VecDeque;
use tracing::debug;

/// Очередь закрытия одной операции
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureQueue {
    /// Закрываются эмуляцией сочетаний, строго по одному (FIFO)
    pub rule_closing: VecDeque<(RunningApp, CloseRule)>,
    /// Закрываются обычным запросом завершения
    pub normal_closing: Vec<RunningApp>,
}

impl ClosureQueue {
    pub fn all_normal(apps: Vec<RunningApp>) -> Self {
        Self {
            rule_closing: VecDeque::new(),
            normal_closing: apps,
        }
    }
}

/// Разделить приложения на "по правилам" и "обычные", сохраняя порядок перечисления
pub fn partition(
    apps: Vec<RunningApp>,
    rules_enabled: bool,
    store: &JsonRuleStore,
) -> Result<ClosureQueue> {
    if !rules_enabled {
        return Ok(ClosureQueue::all_normal(apps));
    }

    let mut queue = ClosureQueue::default();
    for app in apps {
        let rule = match app.descriptor() {
            Some(descriptor) => store.rule_for(descriptor)?,
            None => None,
        };

        match rule {
            Some(rule) if rule.is_active() => {
                debug!("{} закрывается по правилу ({} шагов)", app, rule.value.len());
                queue.rule_closing.push_back((app, rule));
            }
            _ => queue.normal_closing.push(app),
        }
    }

    Ok(queue)
}
