use std::path::Path;

use anyhow::{anyhow, bail, Context};
use http::Method;
use serde_json::{Map, Value};

use super::types::{join_key, ContractRouter, Route};

/// Load a contract from a YAML (`.yaml`/`.yml`) or JSON document
///
/// # Document format
///
/// Every mapping that has both a `method` and a `path` string is a route;
/// any other mapping is a nested router whose entries are walked in document
/// order. Keys starting with `x-` are vendor extensions and are skipped.
///
/// ```yaml
/// pets:
///   get:
///     method: GET
///     path: /pets/{id}
///     responses:
///       200: { type: object }
///   create:
///     method: POST
///     path: /pets
///     body:
///       type: object
///       properties: { name: { type: string } }
///       required: [name]
///     responses:
///       201: { type: object }
/// ```
///
/// Context functions cannot be expressed in a document; attach them afterwards
/// with [`ContractRouter::with_context`].
pub fn load_contract(file_path: impl AsRef<Path>) -> anyhow::Result<ContractRouter> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read contract {}", file_path.display()))?;
    let is_yaml = matches!(
        file_path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let doc: Value = if is_yaml {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", file_path.display()))?;
        yaml_to_json(yaml)?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", file_path.display()))?
    };
    contract_from_value(&doc)
        .with_context(|| format!("invalid contract in {}", file_path.display()))
}

/// Build a contract from an already parsed document
pub fn contract_from_value(doc: &Value) -> anyhow::Result<ContractRouter> {
    let obj = doc
        .as_object()
        .ok_or_else(|| anyhow!("contract root must be a mapping"))?;
    if is_route(obj) {
        bail!("contract root must be a router, found a route");
    }
    router_from_map(obj, "")
}

fn is_route(obj: &Map<String, Value>) -> bool {
    obj.get("method").is_some_and(Value::is_string) && obj.get("path").is_some_and(Value::is_string)
}

fn router_from_map(obj: &Map<String, Value>, prefix: &str) -> anyhow::Result<ContractRouter> {
    let mut router = ContractRouter::new();
    for (key, value) in obj {
        if key.starts_with("x-") {
            continue;
        }
        let key_path = join_key(prefix, key);
        let child = value
            .as_object()
            .ok_or_else(|| anyhow!("'{key_path}' must be a mapping"))?;
        router = if is_route(child) {
            router.route(key.clone(), route_from_map(child, &key_path)?)
        } else {
            router.nest(key.clone(), router_from_map(child, &key_path)?)
        };
    }
    Ok(router)
}

fn route_from_map(obj: &Map<String, Value>, key_path: &str) -> anyhow::Result<Route> {
    let method_str = obj
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_uppercase();
    let method = Method::from_bytes(method_str.as_bytes())
        .with_context(|| format!("'{key_path}' has an invalid method '{method_str}'"))?;
    let path = obj.get("path").and_then(Value::as_str).unwrap_or_default();

    let mut route = Route::new(method, path);
    if let Some(shape) = present(obj, "pathParams") {
        route = route.path_params(shape.clone());
    }
    if let Some(shape) = present(obj, "query") {
        route = route.query(shape.clone());
    }
    if let Some(shape) = present(obj, "headers") {
        route = route.headers(shape.clone());
    }
    if let Some(shape) = present(obj, "body") {
        route = route.body(shape.clone());
    }
    if let Some(summary) = obj.get("summary").and_then(Value::as_str) {
        route = route.summary(summary);
    }
    if let Some(responses) = present(obj, "responses") {
        let responses = responses
            .as_object()
            .ok_or_else(|| anyhow!("'{key_path}.responses' must be a mapping"))?;
        for (status, shape) in responses {
            let code: u16 = status
                .parse()
                .with_context(|| format!("'{key_path}' has a non-numeric response status '{status}'"))?;
            route = route.response(code, shape.clone());
        }
    }
    Ok(route)
}

/// A key that is missing or explicitly `null` counts as undeclared
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Convert YAML to JSON, stringifying non-string mapping keys (e.g. `200:`)
fn yaml_to_json(yaml: serde_yaml::Value) -> anyhow::Result<Value> {
    use serde_yaml::Value as Y;
    Ok(match yaml {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| anyhow!("unsupported YAML number {n}"))?
            }
        }
        Y::String(s) => Value::String(s),
        Y::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<anyhow::Result<Vec<_>>>()?,
        ),
        Y::Mapping(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    Y::String(s) => s,
                    Y::Number(n) => n.to_string(),
                    Y::Bool(b) => b.to_string(),
                    other => bail!("unsupported YAML mapping key {other:?}"),
                };
                out.insert(key, yaml_to_json(v)?);
            }
            Value::Object(out)
        }
        Y::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}
