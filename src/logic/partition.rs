//! Splitting delivery entries from the passthrough operation.

use crate::error::{BootstrapError, Result};
use crate::types::OptionTree;
use serde_json::Value;

/// Pull `key` out of `options`.
///
/// Returns the extracted value (an empty tree when `key` is absent) and a copy
/// of `options` without it.
pub fn partition_options(options: &OptionTree, key: &str) -> (Value, OptionTree) {
    let extracted = options
        .get(key)
        .cloned()
        .unwrap_or_else(|| Value::Object(OptionTree::new()));
    let rest = options
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    (extracted, rest)
}

/// Enforce that the merged passthrough tree names at most one module.
pub fn ensure_single_passthrough(passthrough: &OptionTree) -> Result<()> {
    if passthrough.len() <= 1 {
        return Ok(());
    }
    let mut names: Vec<&str> = passthrough.keys().map(String::as_str).collect();
    names.sort_unstable();
    Err(BootstrapError::config(format!(
        "Only one module can be run at a time; saw modules: {}",
        names.join(", ")
    )))
}
