//! Правила закрытия приложений.
//!
//! Документ правил - JSON, ключ - путь к .desktop файлу приложения. Поддерживаются
//! две формы: исходная (просто объект правил) и версионированная
//! `{"version": 1, "rules": {...}}`. Документ перечитывается при каждом запросе,
//! поэтому изменения от внешнего редактора настроек видны сразу.

use crate::close_error;
use crate::error::{CloseError, Result};
use crate::events::ModifierMask;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const RULES_SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[default]
    Shortcut,
    #[serde(other)]
    Unknown,
}

/// Один аккорд сочетания клавиш
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShortcutStep {
    #[serde(default, deserialize_with = "null_as_default")]
    pub shortcut: String,
    pub state: ModifierMask,
    pub keycode: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CloseRule {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: RuleKind,
    /// Миллисекунды; дробное значение округляется, отрицательное - 0
    #[serde(
        rename = "keyDelay",
        default,
        deserialize_with = "delay_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub key_delay: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: Vec<ShortcutStep>,
}

/// `null` равнозначен отсутствующему полю
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn delay_millis<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<f64>::deserialize(deserializer)?;
    Ok(millis
        .filter(|ms| ms.is_finite())
        .map(|ms| ms.max(0.0).round() as u64))
}

impl CloseRule {
    /// Отсутствующее, выключенное и пустое правило эквивалентны отсутствию правила
    pub fn is_active(&self) -> bool {
        self.enabled && !self.value.is_empty()
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay.unwrap_or(0))
    }

    pub fn shortcuts(&self) -> Vec<&str> {
        self.value.iter().map(|step| step.shortcut.as_str()).collect()
    }
}

/// Разобранный документ правил
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: HashMap<String, CloseRule>,
}

impl RuleSet {
    pub fn decode(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut object = match serde_json::from_str::<Value>(text)? {
            Value::Object(object) => object,
            _ => return Err(close_error!(config_parse, "ожидался JSON объект")),
        };

        let version = object.get("version").map(Value::as_u64);
        let entries = match version {
            Some(version) => {
                let version = version
                    .ok_or_else(|| close_error!(config_parse, "version должна быть числом"))?;
                if version != RULES_SCHEMA_VERSION {
                    return Err(close_error!(
                        config_parse,
                        "неподдерживаемая версия правил: {}",
                        version
                    ));
                }
                match object.remove("rules") {
                    None | Some(Value::Null) => Map::new(),
                    Some(Value::Object(rules)) => rules,
                    Some(_) => return Err(close_error!(config_parse, "rules должен быть объектом")),
                }
            }
            None => object,
        };

        Ok(Self {
            rules: Self::decode_entries(entries),
        })
    }

    /// Каждое правило разбирается отдельно: неверная запись отбрасывается,
    /// и её приложение закрывается обычным способом.
    fn decode_entries(entries: Map<String, Value>) -> HashMap<String, CloseRule> {
        entries
            .into_iter()
            .filter_map(|(descriptor, entry)| {
                match serde_json::from_value::<CloseRule>(entry) {
                    Ok(rule) => Some((descriptor, rule)),
                    Err(e) => {
                        warn!("Правило для {} пропущено: {}", descriptor, e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn get(&self, descriptor: &Path) -> Option<&CloseRule> {
        self.rules.get(descriptor.to_string_lossy().as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone)]
enum RuleSource {
    File(PathBuf),
    Inline(String),
}

/// Доступ только на чтение к сохранённым правилам
#[derive(Debug, Clone)]
pub struct JsonRuleStore {
    source: RuleSource,
}

impl JsonRuleStore {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: RuleSource::File(path.into()),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: RuleSource::Inline(text.into()),
        }
    }

    /// Перечитать и разобрать документ. Отсутствующий файл - пустой набор правил.
    pub fn load(&self) -> Result<RuleSet> {
        match &self.source {
            RuleSource::Inline(text) => RuleSet::decode(text),
            RuleSource::File(path) => match std::fs::read_to_string(path) {
                Ok(text) => RuleSet::decode(&text),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Файл правил {:?} не найден, правил нет", path);
                    Ok(RuleSet::default())
                }
                Err(e) => Err(CloseError::Io(e)),
            },
        }
    }

    pub fn rule_for(&self, descriptor: &Path) -> Result<Option<CloseRule>> {
        Ok(self.load()?.get(descriptor).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str =
        r#"{"app.desktop": {"enabled": true, "value": [{"state": 1, "keycode": 24}]}}"#;

    #[test]
    fn test_scenario_document() {
        let store = JsonRuleStore::from_text(SCENARIO);
        let rule = store.rule_for(Path::new("app.desktop")).unwrap().unwrap();

        assert!(rule.is_active());
        assert_eq!(rule.kind, RuleKind::Shortcut);
        assert_eq!(rule.key_delay(), Duration::ZERO);
        assert_eq!(rule.value[0].state, ModifierMask(1));
        assert_eq!(rule.value[0].keycode, 24);
    }

    #[test]
    fn test_repeated_lookups_are_identical() {
        let store = JsonRuleStore::from_text(SCENARIO);
        let first = store.rule_for(Path::new("app.desktop")).unwrap();
        let second = store.rule_for(Path::new("app.desktop")).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.rule_for(Path::new("other.desktop")).unwrap(), None);
    }

    #[test]
    fn test_malformed_json_is_config_parse() {
        let store = JsonRuleStore::from_text("{\"app.desktop\": ");
        assert!(matches!(
            store.rule_for(Path::new("app.desktop")),
            Err(CloseError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_versioned_document() {
        let text = r#"{"version": 1, "rules": {"/usr/share/applications/firefox.desktop":
            {"enabled": true, "type": "shortcut", "keyDelay": 50,
             "value": [{"shortcut": "<Control>q", "state": 4, "keycode": 24}]}}}"#;
        let set = RuleSet::decode(text).unwrap();
        let rule = set
            .get(Path::new("/usr/share/applications/firefox.desktop"))
            .unwrap();
        assert_eq!(rule.key_delay(), Duration::from_millis(50));
        assert_eq!(rule.shortcuts(), vec!["<Control>q"]);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let err = RuleSet::decode(r#"{"version": 2, "rules": {}}"#).unwrap_err();
        assert!(matches!(err, CloseError::ConfigParse(_)));
    }

    #[test]
    fn test_empty_document_is_valid_and_empty() {
        assert!(RuleSet::decode("").unwrap().is_empty());
        assert!(RuleSet::decode("{}").unwrap().is_empty());
        assert!(RuleSet::decode(r#"{"version": 1}"#).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_kind_and_inactive_rules() {
        let text = r#"{
            "a.desktop": {"enabled": true, "type": "script", "value": [{"state": 0, "keycode": 24}]},
            "b.desktop": {"enabled": false, "value": [{"state": 0, "keycode": 24}]},
            "c.desktop": {"enabled": true, "value": []}
        }"#;
        let set = RuleSet::decode(text).unwrap();
        assert_eq!(set.get(Path::new("a.desktop")).unwrap().kind, RuleKind::Unknown);
        assert!(!set.get(Path::new("b.desktop")).unwrap().is_active());
        assert!(!set.get(Path::new("c.desktop")).unwrap().is_active());
    }

    #[test]
    fn test_broken_entry_does_not_hide_valid_rules() {
        let text = r#"{
            "/apps/a.desktop": {"enabled": true, "value": [{"state": 4, "keycode": 24}]},
            "/apps/b.desktop": {"enabled": true, "value": [{"state": "ctrl", "keycode": 24}]},
            "/apps/c.desktop": "not a rule"
        }"#;
        let set = RuleSet::decode(text).unwrap();

        assert_eq!(set.len(), 1);
        assert!(set.get(Path::new("/apps/a.desktop")).unwrap().is_active());
        assert!(set.get(Path::new("/apps/b.desktop")).is_none());
    }

    #[test]
    fn test_null_fields_mean_absent() {
        let text = r#"{
            "/apps/a.desktop": {"enabled": true, "value": [{"state": 4, "keycode": 24}]},
            "/apps/b.desktop": {"enabled": false, "value": null},
            "/apps/c.desktop": {"enabled": null, "type": null, "keyDelay": null, "value": []}
        }"#;
        let set = RuleSet::decode(text).unwrap();

        assert_eq!(set.len(), 3);
        assert!(set.get(Path::new("/apps/a.desktop")).unwrap().is_active());
        let b = set.get(Path::new("/apps/b.desktop")).unwrap();
        assert!(b.value.is_empty());
        assert!(!b.is_active());
        let c = set.get(Path::new("/apps/c.desktop")).unwrap();
        assert!(!c.enabled);
        assert_eq!(c.kind, RuleKind::Shortcut);
        assert_eq!(c.key_delay(), Duration::ZERO);
    }

    #[test]
    fn test_fractional_key_delay_is_rounded() {
        let text = r#"{
            "/apps/a.desktop": {"enabled": true, "keyDelay": 12.5, "value": [{"state": 4, "keycode": 24}]},
            "/apps/b.desktop": {"enabled": true, "keyDelay": -3, "value": [{"state": 4, "keycode": 24}]}
        }"#;
        let set = RuleSet::decode(text).unwrap();

        assert_eq!(
            set.get(Path::new("/apps/a.desktop")).unwrap().key_delay(),
            Duration::from_millis(13)
        );
        assert_eq!(
            set.get(Path::new("/apps/b.desktop")).unwrap().key_delay(),
            Duration::ZERO
        );
    }

    #[test]
    fn test_non_object_document_is_config_parse() {
        assert!(matches!(RuleSet::decode("[1, 2]"), Err(CloseError::ConfigParse(_))));
        assert!(matches!(
            RuleSet::decode(r#"{"version": 1, "rules": []}"#),
            Err(CloseError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = JsonRuleStore::from_path("/nonexistent/session-close/rules.json");
        assert!(store.load().unwrap().is_empty());
    }
}
