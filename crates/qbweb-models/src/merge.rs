//! Structural JSON merge used for unmodelled record fields and user config.

use serde_json::{Map, Value};

/// Recursively merge `source` into `target`.
///
/// Objects merge key by key; any other value in `source` replaces the value in
/// `target`, including `null`.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_object(target, source),
        (target, source) => *target = source,
    }
}

/// Merge the entries of `source` into `target` using [`deep_merge`] per key.
pub fn merge_object(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_field_by_field() {
        let mut target = json!({
            "pagination": {"rowsPerPage": 1000, "page": 2},
            "updateInterval": 2000
        });
        deep_merge(&mut target, json!({"pagination": {"rowsPerPage": 50}}));
        assert_eq!(
            target,
            json!({"pagination": {"rowsPerPage": 50, "page": 2}, "updateInterval": 2000})
        );
    }

    #[test]
    fn scalars_and_arrays_are_replaced() {
        let mut target = json!({"list": [1, 2, 3], "name": "a", "flag": true});
        deep_merge(&mut target, json!({"list": [4], "name": null}));
        assert_eq!(target, json!({"list": [4], "name": null, "flag": true}));
    }

    #[test]
    fn object_replaces_scalar() {
        let mut target = json!({"filter": 3});
        deep_merge(&mut target, json!({"filter": {"site": "example.org"}}));
        assert_eq!(target, json!({"filter": {"site": "example.org"}}));
    }
}
