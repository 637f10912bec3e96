//! Turning string-typed request parts into JSON values before validation.
//!
//! Path parameters, headers and query values arrive as text. In tolerant mode
//! they are coerced to the primitive type their property shape declares, so
//! `{"type": "integer"}` accepts `"42"` and hands the handler `42`. Text that
//! does not parse is left as a string and the validator reports it.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// First non-`null` type named by a schema (`"integer"` or `["integer", "null"]`)
fn declared_type(schema: Option<&Value>) -> Option<&str> {
    match schema?.get("type")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(types) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ => None,
    }
}

fn convert_primitive(val: &str, schema: Option<&Value>) -> Value {
    match declared_type(schema) {
        Some("integer") => val
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(val.to_string())),
        Some("number") => val
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(val.to_string())),
        Some("boolean") => val
            .parse::<bool>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(val.to_string())),
        _ => Value::String(val.to_string()),
    }
}

/// Decode one textual value according to its property shape
///
/// Arrays accept comma separated text; objects accept JSON text. Anything that
/// cannot be decoded stays a string.
#[must_use]
pub fn decode_param_value(value: &str, schema: Option<&Value>) -> Value {
    match declared_type(schema) {
        Some("array") => {
            let items_schema = schema.and_then(|s| s.get("items"));
            let parts = value
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|p| convert_primitive(p.trim(), items_schema))
                .collect::<Vec<_>>();
            Value::Array(parts)
        }
        Some("object") => {
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
        }
        _ => convert_primitive(value, schema),
    }
}

fn property_schema<'a>(shape: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    shape?.get("properties")?.get(key)
}

/// Build the object validated against a path parameter or header shape
#[must_use]
pub fn coerce_string_map(values: &HashMap<String, String>, shape: Option<&Value>) -> Value {
    let obj: Map<String, Value> = values
        .iter()
        .map(|(k, v)| (k.clone(), decode_param_value(v, property_schema(shape, k))))
        .collect();
    Value::Object(obj)
}

/// Build the object validated against a query shape
///
/// Repeated keys become arrays in wire order. With `json_query` every value is
/// first decoded as JSON text (falling back to the raw string) and no further
/// coercion happens; otherwise values are coerced like path parameters, and a
/// key whose property shape is an array always yields an array.
#[must_use]
pub fn query_object(pairs: &[(String, String)], shape: Option<&Value>, json_query: bool) -> Value {
    let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
    for (key, raw) in pairs {
        match grouped.iter_mut().find(|(k, _)| *k == key.as_str()) {
            Some((_, values)) => values.push(raw.as_str()),
            None => grouped.push((key.as_str(), vec![raw.as_str()])),
        }
    }

    let mut obj = Map::with_capacity(grouped.len());
    for (key, raws) in grouped {
        let schema = property_schema(shape, key);
        let value = if json_query {
            let mut decoded: Vec<Value> = raws
                .iter()
                .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
                .collect();
            if decoded.len() == 1 {
                decoded.remove(0)
            } else {
                Value::Array(decoded)
            }
        } else if declared_type(schema) == Some("array") {
            let items = raws
                .iter()
                .flat_map(|raw| match decode_param_value(raw, schema) {
                    Value::Array(items) => items,
                    other => vec![other],
                })
                .collect();
            Value::Array(items)
        } else if raws.len() == 1 {
            decode_param_value(raws[0], schema)
        } else {
            Value::Array(raws.iter().map(|raw| decode_param_value(raw, schema)).collect())
        };
        obj.insert(key.to_string(), value);
    }
    Value::Object(obj)
}
