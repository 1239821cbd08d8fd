//! Deep merge of two option trees.

use crate::types::OptionTree;
use serde_json::Value;

/// Merge `overrides` on top of `base`.
///
/// Where both sides hold a tree the two are merged recursively. Any other
/// conflict is won by `overrides`. Keys present on one side only pass through.
pub fn merge_trees(base: &OptionTree, overrides: &OptionTree) -> OptionTree {
    let mut merged = base.clone();
    for (key, value) in overrides {
        match merged.get_mut(key) {
            Some(slot) => merge_value(slot, value),
            None => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

fn merge_value(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                if let Some(base_value) = base_map.get_mut(key) {
                    merge_value(base_value, patch_value);
                } else {
                    base_map.insert(key.clone(), patch_value.clone());
                }
            }
        }
        (base_slot, patch_value) => {
            *base_slot = patch_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> OptionTree {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_override_wins_on_scalar_conflict() {
        let merged = merge_trees(&tree(json!({"k": "a"})), &tree(json!({"k": "b"})));
        assert_eq!(merged.get("k"), Some(&json!("b")));
    }

    #[test]
    fn test_nested_trees_merge_recursively() {
        let merged = merge_trees(
            &tree(json!({"/a": {"src": "/a", "mode": "0644"}})),
            &tree(json!({"/a": {"src": "/a", "dest": "/b"}})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({"/a": {"src": "/a", "mode": "0644", "dest": "/b"}})
        );
    }

    #[test]
    fn test_sequences_are_replaced_not_concatenated() {
        let merged = merge_trees(&tree(json!({"l": [1, 2]})), &tree(json!({"l": [3]})));
        assert_eq!(merged.get("l"), Some(&json!([3])));
    }

    #[test]
    fn test_disjoint_keys_commute() {
        let a = tree(json!({"x": 1}));
        let b = tree(json!({"y": {"z": 2}}));
        assert_eq!(merge_trees(&a, &b), merge_trees(&b, &a));
    }
}
