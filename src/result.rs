//! Uniform result records returned by every capability and by the dispatcher.

use crate::types::OptionTree;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the side-channel field the observer consumes.
pub const CLEANED_INVOCATION_KEY: &str = "cleaned_invocation";

/// Outcome of one module invocation (delivery, handler, fallback, or the
/// dispatcher itself).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Whether the module succeeded.
    pub succeeded: bool,
    /// Human-readable explanation, always set on failure by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Module-specific output (`changed`, `stdout`, `rc`, ...).
    #[serde(flatten)]
    pub fields: OptionTree,
    /// What actually ran, as reported downstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation: Option<Invocation>,
    /// Side channel written by the annotator and removed by the observer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaned_invocation: Option<CleanedInvocation>,
}

/// Invocation metadata as displayed by the reporting layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub module_args: String,
    #[serde(default)]
    pub module_complex_args: OptionTree,
}

/// Partial invocation metadata; absent fields fall back to observer defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedInvocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_complex_args: Option<OptionTree>,
}

impl ResultRecord {
    /// A successful record with no output fields.
    pub fn ok() -> Self {
        Self {
            succeeded: true,
            ..Self::default()
        }
    }

    /// A failed record carrying `message`.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Check if the module succeeded.
    pub fn is_successful(&self) -> bool {
        self.succeeded
    }

    /// The conventional `changed` flag; missing or non-boolean reads as false.
    pub fn changed(&self) -> bool {
        self.fields
            .get("changed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_record() {
        let record = ResultRecord::failed("copy failed");
        assert!(!record.is_successful());
        assert_eq!(record.message.as_deref(), Some("copy failed"));
        assert!(!record.changed());
    }

    #[test]
    fn test_fields_flatten_into_json() {
        let record = ResultRecord::ok()
            .with_field("changed", true)
            .with_field("stdout", "hi");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"succeeded": true, "changed": true, "stdout": "hi"}));
        assert!(record.changed());
    }

    #[test]
    fn test_side_channel_serialized_under_well_known_key() {
        let record = ResultRecord {
            cleaned_invocation: Some(CleanedInvocation {
                module_name: Some("command".to_string()),
                ..CleanedInvocation::default()
            }),
            ..ResultRecord::ok()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value[CLEANED_INVOCATION_KEY],
            json!({"module_name": "command"})
        );
    }

    #[test]
    fn test_deserialize_keeps_unknown_keys_as_fields() {
        let record: ResultRecord =
            serde_json::from_value(json!({"succeeded": false, "rc": 2, "message": "boom"}))
                .unwrap();
        assert_eq!(record.fields.get("rc"), Some(&json!(2)));
        assert_eq!(record.message.as_deref(), Some("boom"));
        assert!(record.invocation.is_none());
    }
}
