//! Recursive option filtering.
//!
//! Only leaves are ever dropped: a nested tree whose every leaf was removed
//! stays in place as an empty tree.

use crate::types::OptionTree;
use serde_json::Value;

/// Keep every scalar leaf for which `keep` holds.
///
/// Trees are filtered recursively. Sequences are filtered element-wise in
/// order; tree elements inside a sequence are always kept and filtered in turn.
pub fn filter_recursive<F>(keep: &F, options: &OptionTree) -> OptionTree
where
    F: Fn(&Value) -> bool,
{
    let mut filtered = OptionTree::new();
    for (key, value) in options {
        if let Some(value) = filter_value(keep, value) {
            filtered.insert(key.clone(), value);
        }
    }
    filtered
}

fn filter_value<F>(keep: &F, value: &Value) -> Option<Value>
where
    F: Fn(&Value) -> bool,
{
    match value {
        Value::Object(tree) => Some(Value::Object(filter_recursive(keep, tree))),
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| filter_value(keep, item))
                .collect(),
        )),
        scalar if keep(scalar) => Some(scalar.clone()),
        _ => None,
    }
}

/// Strip every leaf equal to the omitted-value sentinel.
pub fn strip_omitted(options: &OptionTree, omit_token: &str) -> OptionTree {
    filter_recursive(&|v: &Value| v.as_str() != Some(omit_token), options)
}
