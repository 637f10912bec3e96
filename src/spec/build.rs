use serde_json::{json, Map, Value};

/// Extract placeholder names from a path pattern
///
/// Both `{id}` and `:id` segment styles are recognised. Names are returned in
/// the order they appear.
///
/// ```rust
/// use contract_router::spec::path_param_names;
///
/// assert_eq!(path_param_names("/users/{user_id}/posts/:post_id"), vec!["user_id", "post_id"]);
/// assert!(path_param_names("/health").is_empty());
/// ```
#[must_use]
pub fn path_param_names(path: &str) -> Vec<String> {
    let mut names = Vec::with_capacity(path.matches(['{', ':']).count());
    for segment in path.split('/') {
        if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
            names.push(segment[1..segment.len() - 1].to_string());
        } else if let Some(name) = segment.strip_prefix(':') {
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Path parameter shape used when a route does not declare one
///
/// Every placeholder becomes a required `string` property. Undeclared extra
/// parameters are allowed since path params are validated in tolerant mode.
#[must_use]
pub fn derive_path_params_shape(path: &str) -> Value {
    let names = path_param_names(path);
    let properties: Map<String, Value> = names
        .iter()
        .map(|n| (n.clone(), json!({"type": "string"})))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": names,
    })
}

/// Lowercase the property names of a header shape
///
/// Inbound header names are lowercased before validation, so the declared
/// shape must use the same spelling. `properties` keys and `required` entries
/// are rewritten; anything else is left untouched.
#[must_use]
pub fn normalize_header_shape(shape: Value) -> Value {
    let Value::Object(mut obj) = shape else {
        return shape;
    };
    if let Some(Value::Object(props)) = obj.remove("properties") {
        let lowered: Map<String, Value> = props
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        obj.insert("properties".to_string(), Value::Object(lowered));
    }
    if let Some(Value::Array(required)) = obj.remove("required") {
        let lowered: Vec<Value> = required
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Value::String(s.to_ascii_lowercase()),
                other => other,
            })
            .collect();
        obj.insert("required".to_string(), Value::Array(lowered));
    }
    Value::Object(obj)
}
