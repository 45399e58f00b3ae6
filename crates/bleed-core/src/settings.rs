//! Typed per-world propagation settings.
//!
//! The settings store hands back loosely-typed key/value rows shared with
//! every other per-world setting. [`PropagationSettings::from_entries`] is
//! the one place those rows are interpreted: it picks out the bleed keys,
//! coerces their values, and fills everything absent with the fail-closed
//! defaults. Evaluation code only ever sees the typed struct.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EchoError;

/// Settings key toggling propagation for a world.
pub const KEY_BLEED_ENABLED: &str = "bleed_enabled";

/// Settings key holding the minimum impact level that may propagate.
pub const KEY_MIN_IMPACT: &str = "bleed_min_impact";

/// Settings key holding the maximum cascade depth.
pub const KEY_MAX_DEPTH: &str = "bleed_max_depth";

/// Minimum impact used when none is configured: one above the highest
/// possible impact, so nothing qualifies.
pub const DISABLED_MIN_IMPACT: i32 = 11;

/// One raw row from the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    /// Setting name.
    pub key: String,
    /// Setting value as stored (bool, number, or string encoding of either).
    pub value: Value,
}

impl SettingEntry {
    /// Build an entry from a key and any JSON-convertible value.
    pub fn new(key: &str, value: impl Into<Value>) -> Self {
        Self {
            key: key.to_owned(),
            value: value.into(),
        }
    }
}

/// Propagation configuration for one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationSettings {
    /// Whether events of this world may propagate at all.
    pub bleed_enabled: bool,
    /// Lowest impact level that may propagate.
    pub min_impact: i32,
    /// Echo-sourced events at or beyond this depth stop cascading.
    pub max_cascade_depth: u32,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self::disabled()
    }
}

impl PropagationSettings {
    /// The fail-closed settings used for a world with nothing configured.
    pub const fn disabled() -> Self {
        Self {
            bleed_enabled: false,
            min_impact: DISABLED_MIN_IMPACT,
            max_cascade_depth: 0,
        }
    }

    /// Map settings rows onto the typed struct.
    ///
    /// Unrelated keys are ignored. Missing or `null` keys keep their
    /// fail-closed default. When a key appears more than once the last row
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns [`EchoError::Validation`] when a bleed key is present but its
    /// value cannot be read as the expected type.
    pub fn from_entries(entries: &[SettingEntry]) -> Result<Self, EchoError> {
        let mut settings = Self::disabled();

        for entry in entries {
            if entry.value.is_null() {
                continue;
            }
            match entry.key.as_str() {
                KEY_BLEED_ENABLED => {
                    settings.bleed_enabled = parse_bool(&entry.key, &entry.value)?;
                }
                KEY_MIN_IMPACT => {
                    let raw = parse_int(&entry.key, &entry.value)?;
                    settings.min_impact = i32::try_from(raw).map_err(|e| {
                        EchoError::Validation(format!("{KEY_MIN_IMPACT} out of range: {raw} ({e})"))
                    })?;
                }
                KEY_MAX_DEPTH => {
                    let raw = parse_int(&entry.key, &entry.value)?;
                    settings.max_cascade_depth = u32::try_from(raw).map_err(|e| {
                        EchoError::Validation(format!("{KEY_MAX_DEPTH} out of range: {raw} ({e})"))
                    })?;
                }
                _ => {}
            }
        }

        Ok(settings)
    }
}

fn parse_bool(key: &str, value: &Value) -> Result<bool, EchoError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(malformed(key, value)),
        },
        _ => Err(malformed(key, value)),
    }
}

fn parse_int(key: &str, value: &Value) -> Result<i64, EchoError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| malformed(key, value)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| EchoError::Validation(format!("malformed setting {key}: {value} ({e})"))),
        _ => Err(malformed(key, value)),
    }
}

fn malformed(key: &str, value: &Value) -> EchoError {
    EchoError::Validation(format!("malformed setting {key}: {value}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_rows_fail_closed() {
        let settings = PropagationSettings::from_entries(&[]);
        assert_eq!(settings.ok(), Some(PropagationSettings::disabled()));
    }

    #[test]
    fn native_and_string_values_are_accepted() {
        let rows = [
            SettingEntry::new(KEY_BLEED_ENABLED, json!("true")),
            SettingEntry::new(KEY_MIN_IMPACT, json!("8")),
            SettingEntry::new(KEY_MAX_DEPTH, json!(2)),
            SettingEntry::new("ai_model", json!("some-model")),
        ];
        let settings = PropagationSettings::from_entries(&rows).ok();
        assert_eq!(
            settings,
            Some(PropagationSettings {
                bleed_enabled: true,
                min_impact: 8,
                max_cascade_depth: 2,
            })
        );
    }

    #[test]
    fn enabled_without_threshold_still_blocks_everything() {
        let rows = [SettingEntry::new(KEY_BLEED_ENABLED, json!(true))];
        let settings = PropagationSettings::from_entries(&rows).ok();
        assert_eq!(settings.map(|s| s.min_impact), Some(DISABLED_MIN_IMPACT));
    }

    #[test]
    fn null_value_keeps_default() {
        let rows = [SettingEntry::new(KEY_BLEED_ENABLED, Value::Null)];
        let settings = PropagationSettings::from_entries(&rows).ok();
        assert_eq!(settings.map(|s| s.bleed_enabled), Some(false));
    }

    #[test]
    fn malformed_values_are_validation_errors() {
        for row in [
            SettingEntry::new(KEY_BLEED_ENABLED, json!("maybe")),
            SettingEntry::new(KEY_MIN_IMPACT, json!("eight")),
            SettingEntry::new(KEY_MAX_DEPTH, json!(-1)),
            SettingEntry::new(KEY_MAX_DEPTH, json!([2])),
        ] {
            let result = PropagationSettings::from_entries(std::slice::from_ref(&row));
            assert!(
                matches!(result, Err(EchoError::Validation(_))),
                "expected validation error for {row:?}"
            );
        }
    }
}
