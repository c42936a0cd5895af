//! JSON value helpers shared by store implementations.

use serde_json::Value;

/// Deep-merge `patch` into `base`.
///
/// Object fields merge recursively; any other value (including arrays)
/// replaces the existing one wholesale. This matches the merge-write
/// semantics aggregates rely on: a partial status update must not clobber
/// unrelated fields, while a line-item array is always written as a unit.
pub fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => merge(base_value, patch_value),
                    None => {
                        base_map.insert(key, patch_value);
                    }
                }
            }
        }
        (base_slot, patch_value) => *base_slot = patch_value,
    }
}

/// Look up a dot-separated field path in a JSON value.
///
/// Returns `None` if any intermediate step is missing or not an object.
#[must_use]
pub fn field<'a>(value: &'a Value, field_path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in field_path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Total order over JSON values for query sorting.
///
/// Types order as Null < Bool < Number < String < Array < Object; values of
/// the same type compare naturally. RFC 3339 timestamps are strings and sort
/// chronologically under lexicographic comparison.
#[must_use]
pub fn compare(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xi, yi) in x.iter().zip(y.iter()) {
                let ord = compare(xi, yi);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_preserves_unrelated_fields() {
        let mut base = json!({"status": "pending", "items": [1, 2], "note": "keep me"});
        merge(&mut base, json!({"status": "paid"}));
        assert_eq!(
            base,
            json!({"status": "paid", "items": [1, 2], "note": "keep me"})
        );
    }

    #[test]
    fn test_merge_recurses_into_objects() {
        let mut base = json!({"amounts": {"subtotal": "10", "total": "10"}});
        merge(&mut base, json!({"amounts": {"total": "8"}}));
        assert_eq!(base, json!({"amounts": {"subtotal": "10", "total": "8"}}));
    }

    #[test]
    fn test_merge_replaces_arrays_wholesale() {
        let mut base = json!({"items": [1, 2, 3]});
        merge(&mut base, json!({"items": [9]}));
        assert_eq!(base, json!({"items": [9]}));
    }

    #[test]
    fn test_field_lookup() {
        let value = json!({"a": {"b": {"c": 7}}});
        assert_eq!(field(&value, "a.b.c"), Some(&json!(7)));
        assert_eq!(field(&value, "a.missing"), None);
    }

    #[test]
    fn test_compare_timestamps_lexicographically() {
        let earlier = json!("2026-01-02T00:00:00Z");
        let later = json!("2026-01-10T00:00:00Z");
        assert_eq!(compare(&earlier, &later), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_compare_mixed_types_by_rank() {
        assert_eq!(
            compare(&Value::Null, &json!(false)),
            std::cmp::Ordering::Less
        );
        assert_eq!(compare(&json!(3), &json!("3")), std::cmp::Ordering::Less);
    }
}
