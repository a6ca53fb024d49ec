//! Configuration merge logic
//!
//! Layers are merged with:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins), so a deployment can narrow `poll.routes`
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        // Arrays and scalars: overlay wins outright.
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(
            json!({"poll": {"interval_seconds": 30}}),
            json!({"poll": {"interval_seconds": 60}}),
        );
        assert_eq!(result["poll"]["interval_seconds"], 60);
    }

    #[test]
    fn test_sibling_keys_survive() {
        let base = json!({
            "submit": {"mode": "navigation", "timeout_seconds": 30}
        });
        let overlay = json!({
            "submit": {"mode": "in_page"}
        });
        let result = deep_merge(base, overlay);
        assert_eq!(result["submit"]["mode"], "in_page");
        assert_eq!(result["submit"]["timeout_seconds"], 30);
    }

    #[test]
    fn test_routes_are_replaced_not_appended() {
        let base = json!({"poll": {"routes": ["/approval", "/emails/upload/progress"]}});
        let overlay = json!({"poll": {"routes": ["/approval"]}});
        let result = deep_merge(base, overlay);
        assert_eq!(result["poll"]["routes"], json!(["/approval"]));
    }

    #[test]
    fn test_merge_layers_precedence() {
        let layers = vec![
            json!({"upload": {"max_bytes": 1, "extension": "csv"}}),
            json!({"upload": {"max_bytes": 2}}),
            json!({"upload": {"max_bytes": 3}}),
        ];
        let result = merge_layers(layers);
        assert_eq!(result["upload"]["max_bytes"], 3);
        assert_eq!(result["upload"]["extension"], "csv");
    }

    #[test]
    fn test_merge_layers_empty() {
        assert_eq!(merge_layers(Vec::new()), Value::Null);
    }
}
