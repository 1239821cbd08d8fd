//! Core data types shared by the partitioning and dispatch layers.
//!
//! Configuration of every shape (structured arguments, decoded flat arguments,
//! per-source options) is carried as an `OptionTree`, so both input
//! representations collapse into one in-memory type before any processing.

use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};

/// Nested configuration: string keys mapping to scalars, nested trees, or
/// ordered sequences of either.
pub type OptionTree = Map<String, Value>;

/// Raised for any delivery entry without a usable `src`.
pub const MISSING_SRC: &str = "All sources must define src=path";

/// Marker that distinguishes absolute remote paths.
pub const PATH_ROOT: char = '/';

/// Stages of a single dispatch call, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStage {
    Filtering,
    Merging,
    Partitioning,
    ResolvingSources,
    Delivering,
    ResolvingPassthrough,
    Invoking,
    Done,
}

/// Which route the passthrough operation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum InvocationPath {
    /// A registered handler matched the module name
    Handler,
    /// The generic low-level executor ran the module
    Fallback,
}

/// One file-delivery request after destination resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Local source path; also the key that identifies the entry
    pub src: String,
    /// Remote destination; `None` only before resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Any other delivery options (mode, owner, ...), passed through verbatim
    #[serde(flatten)]
    pub extra: OptionTree,
}

impl SourceSpec {
    /// Build a spec from a decoded entry.
    ///
    /// `src` must be a non-empty scalar. `dest` may be absent, `null` or a
    /// scalar; a tree or sequence there is a configuration error.
    pub fn from_tree(entry: &OptionTree) -> Result<Self> {
        let src = entry
            .get("src")
            .and_then(scalar_text)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BootstrapError::config(MISSING_SRC))?;
        let dest = match entry.get("dest") {
            None | Some(Value::Null) => None,
            Some(Value::Array(_)) | Some(Value::Object(_)) => {
                return Err(BootstrapError::config(format!(
                    "dest for src={} must be a path",
                    src
                )));
            }
            Some(scalar) => scalar_text(scalar),
        };
        let extra = entry
            .iter()
            .filter(|(k, _)| k.as_str() != "src" && k.as_str() != "dest")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self { src, dest, extra })
    }

    /// Render back into a tree (the structured delivery arguments).
    pub fn to_tree(&self) -> OptionTree {
        let mut tree = OptionTree::new();
        tree.insert("src".to_string(), Value::String(self.src.clone()));
        if let Some(ref dest) = self.dest {
            tree.insert("dest".to_string(), Value::String(dest.clone()));
        }
        for (k, v) in &self.extra {
            tree.insert(k.clone(), v.clone());
        }
        tree
    }
}

/// The one operation to run after every delivery succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassthroughSpec {
    /// Module name, looked up in the handler registry
    pub name: String,
    /// Flat key=value form of the arguments
    pub module_args: String,
    /// Structured form of the arguments, when they were given as a tree
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complex_args: Option<OptionTree>,
    /// Bypass the registry and go straight to the generic executor
    #[serde(default)]
    pub skip_handler: bool,
}

/// Render a scalar as text. Trees and sequences have no scalar form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Interpret a boolean-ish option value (`true`, `"yes"`, `"1"`, `"on"`, ...).
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" | "y" => Some(true),
            "false" | "no" | "off" | "0" | "n" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn tree(value: Value) -> OptionTree {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_stage_order_and_display() {
        let stages: Vec<String> = DispatchStage::iter().map(|s| s.to_string()).collect();
        assert_eq!(stages.first().map(String::as_str), Some("filtering"));
        assert_eq!(stages.last().map(String::as_str), Some("done"));
        assert_eq!(
            DispatchStage::from_str("resolving_sources").unwrap(),
            DispatchStage::ResolvingSources
        );
    }

    #[test]
    fn test_source_spec_from_tree() {
        let spec =
            SourceSpec::from_tree(&tree(json!({"src": "/a", "dest": "b", "mode": "0644"}))).unwrap();
        assert_eq!(spec.src, "/a");
        assert_eq!(spec.dest.as_deref(), Some("b"));
        assert_eq!(spec.extra.get("mode"), Some(&json!("0644")));
        assert!(!spec.extra.contains_key("src"));
    }

    #[test]
    fn test_source_spec_requires_src() {
        for entry in [
            json!({"dest": "/b"}),
            json!({"src": ""}),
            json!({"src": {"nested": 1}}),
        ] {
            let err = SourceSpec::from_tree(&tree(entry)).unwrap_err();
            assert!(err.is_config());
            assert!(err.to_string().contains(MISSING_SRC));
        }
    }

    #[test]
    fn test_source_spec_rejects_structured_dest() {
        for dest in [json!({"path": "/b"}), json!(["/b", "/c"])] {
            let err = SourceSpec::from_tree(&tree(json!({"src": "/a", "dest": dest}))).unwrap_err();
            assert!(err.is_config());
            assert!(err.to_string().contains("dest for src=/a"));
        }
        let spec = SourceSpec::from_tree(&tree(json!({"src": "/a", "dest": null}))).unwrap();
        assert!(spec.dest.is_none());
    }

    #[test]
    fn test_source_spec_to_tree_keeps_extra() {
        let spec = SourceSpec {
            src: "/a".to_string(),
            dest: Some("/b".to_string()),
            extra: tree(json!({"owner": "root"})),
        };
        assert_eq!(
            Value::Object(spec.to_tree()),
            json!({"src": "/a", "dest": "/b", "owner": "root"})
        );
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(&json!(true)), Some(true));
        assert_eq!(parse_flag(&json!("yes")), Some(true));
        assert_eq!(parse_flag(&json!("False")), Some(false));
        assert_eq!(parse_flag(&json!(0)), Some(false));
        assert_eq!(parse_flag(&json!("maybe")), None);
        assert_eq!(parse_flag(&json!([true])), None);
    }
}
