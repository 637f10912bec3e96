#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::bail;
use contract_router::handlers::{ImplTree, RouteOutput};
use contract_router::registry::register;
use contract_router::router::MemoryRouter;
use contract_router::runtime_config::EngineOptions;
use contract_router::spec::{ContractRouter, Route};
use serde_json::{json, Value};

pub fn name_shape() -> Value {
    json!({
        "type": "object",
        "properties": {"name": {"type": "string"}},
        "required": ["name"]
    })
}

pub fn open_object() -> Value {
    json!({"type": "object", "additionalProperties": true})
}

/// Pet store contract used across the integration tests
pub fn pet_contract() -> ContractRouter {
    let pets = ContractRouter::new()
        .route(
            "list",
            Route::get("/pets")
                .query(json!({
                    "type": "object",
                    "properties": {
                        "limit": {"type": "integer", "minimum": 1},
                        "active": {"type": "boolean"},
                        "tag": {"type": "array", "items": {"type": "string"}}
                    }
                }))
                .response(200, open_object()),
        )
        .route(
            "get",
            Route::get("/pets/{id}")
                .path_params(json!({
                    "type": "object",
                    "properties": {"id": {"type": "string"}},
                    "required": ["id"]
                }))
                .response(
                    200,
                    json!({
                        "type": "object",
                        "properties": {"id": {"type": "string"}, "name": {"type": "string"}},
                        "required": ["id"]
                    }),
                )
                .response(
                    404,
                    json!({"type": "object", "properties": {"error": {"type": "string"}}}),
                ),
        )
        .route(
            "create",
            Route::post("/pets")
                .body(name_shape())
                .response(201, name_shape()),
        )
        .route(
            "update",
            Route::put("/pets/:id")
                .headers(json!({
                    "type": "object",
                    "properties": {"X-Tenant": {"type": "string"}},
                    "required": ["X-Tenant"]
                }))
                .query(json!({
                    "type": "object",
                    "properties": {"dryRun": {"type": "boolean"}}
                }))
                .body(name_shape()),
        )
        .route(
            "remove",
            Route::delete("/pets/{id}").response(204, json!({"type": "null"})),
        );

    ContractRouter::new()
        .route(
            "health",
            Route::get("/health").response(
                200,
                json!({
                    "type": "object",
                    "properties": {"ok": {"type": "boolean"}}
                }),
            ),
        )
        .nest("pets", pets)
}

/// Implementation of [`pet_contract`]; `calls` counts handler invocations
pub fn pet_impl(calls: Arc<AtomicUsize>) -> ImplTree {
    let tick = move || {
        let calls = Arc::clone(&calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    };
    let (c1, c2, c3, c4, c5) = (tick(), tick(), tick(), tick(), tick());

    let pets = ImplTree::new()
        .handle("list", move |input| {
            c1();
            async move { Ok(RouteOutput::json(200, json!({"query": input.query}))) }
        })
        .handle("get", move |input| {
            c2();
            async move {
                let id = input.params["id"].as_str().unwrap_or_default().to_string();
                Ok(match id.as_str() {
                    "missing" => RouteOutput::json(404, json!({"error": "not found"})),
                    "explode" => bail!("storage unavailable"),
                    "teapot" => RouteOutput::json(42, json!({})),
                    _ => RouteOutput::json(200, json!({"id": id, "name": "Rex"}))
                        .header("X-Pet-Id", id.clone()),
                })
            }
        })
        .handle("create", move |input| {
            c3();
            async move {
                if input.body["name"] == "broken" {
                    return Ok(RouteOutput::json(201, json!({"extra": 1})));
                }
                Ok(RouteOutput::json(201, input.body))
            }
        })
        .handle("update", move |input| {
            c4();
            async move {
                Ok(RouteOutput::json(
                    200,
                    json!({
                        "id": input.params["id"],
                        "tenant": input.headers["x-tenant"],
                        "dryRun": input.query.get("dryRun").cloned().unwrap_or(Value::Null),
                        "name": input.body["name"],
                    }),
                ))
            }
        })
        .handle("remove", move |_input| {
            c5();
            async move { Ok(RouteOutput::json(204, Value::Null)) }
        });

    ImplTree::new()
        .handle("health", |_input| async move {
            Ok(RouteOutput::json(200, json!({"ok": true})))
        })
        .nest("pets", pets)
}

/// Register the pet store on a fresh [`MemoryRouter`]
pub fn pet_host(options: &EngineOptions) -> (MemoryRouter, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut host = MemoryRouter::new();
    register(&mut host, &pet_contract(), &pet_impl(Arc::clone(&calls)), options)
        .expect("pet store registers");
    (host, calls)
}

pub fn call_count(calls: &AtomicUsize) -> usize {
    calls.load(Ordering::SeqCst)
}
