//! Request validation and dispatch through registered handler chains
//!
//! Every test registers the pet store contract on a `MemoryRouter` and drives
//! requests through it, checking the fixed validation order (params, headers,
//! query, body), the 400 short-circuit, JSON query decoding and response
//! validation.

mod common;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use common::{call_count, pet_contract, pet_host, pet_impl};
use contract_router::error::{RequestError, RequestFailure};
use contract_router::registry::register;
use contract_router::router::MemoryRouter;
use contract_router::runtime_config::{EngineOptions, MissingResponseShape};
use contract_router::server::{HttpRequest, HttpResponse};
use http::Method;
use serde_json::json;

#[tokio::test]
async fn extra_path_params_are_tolerated() {
    let (host, calls) = pet_host(&EngineOptions::default());
    let req = HttpRequest::new(Method::GET, "/pets/42").path_param("owner", "7");
    let res = host.handle(req).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "42");
    assert_eq!(call_count(&calls), 1);
}

#[tokio::test]
async fn empty_body_is_rejected_before_the_handler() {
    let (host, calls) = pet_host(&EngineOptions::default());
    let res = host
        .handle(HttpRequest::new(Method::POST, "/pets").json(json!({})))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["part"], "body");
    assert!(!res.body["issues"].as_array().unwrap().is_empty());
    assert_eq!(call_count(&calls), 0);
}

#[tokio::test]
async fn missing_body_is_rejected_when_a_shape_is_declared() {
    let (host, calls) = pet_host(&EngineOptions::default());
    let res = host.handle(HttpRequest::new(Method::POST, "/pets")).await;
    assert_eq!(res.status, 400);
    assert_eq!(call_count(&calls), 0);
}

#[tokio::test]
async fn body_rejects_undeclared_keys() {
    let (host, _) = pet_host(&EngineOptions::default());
    let res = host
        .handle(HttpRequest::new(Method::POST, "/pets").json(json!({"name": "Rex", "age": 3})))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["part"], "body");
}

#[tokio::test]
async fn valid_body_reaches_the_handler() {
    let (host, calls) = pet_host(&EngineOptions::default());
    let res = host
        .handle(HttpRequest::new(Method::POST, "/pets").json(json!({"name": "Rex"})))
        .await;
    assert_eq!(res.status, 201);
    assert_eq!(res.body, json!({"name": "Rex"}));
    assert_eq!(res.get_header("content-type"), Some("application/json"));
    assert_eq!(call_count(&calls), 1);
}

#[tokio::test]
async fn query_values_are_coerced_to_declared_types() {
    let (host, _) = pet_host(&EngineOptions::default());
    let res = host
        .handle(HttpRequest::new(Method::GET, "/pets?limit=10&tag=a&tag=b&other=x"))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["query"]["limit"], 10);
    assert_eq!(res.body["query"]["tag"], json!(["a", "b"]));
    assert_eq!(res.body["query"]["other"], "x");
}

#[tokio::test]
async fn query_violations_are_reported_as_query() {
    let (host, calls) = pet_host(&EngineOptions::default());
    let res = host
        .handle(HttpRequest::new(Method::GET, "/pets?limit=0"))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["part"], "query");
    assert_eq!(call_count(&calls), 0);
}

#[tokio::test]
async fn json_query_decodes_values() {
    let options = EngineOptions::default().json_query(true);
    let (host, _) = pet_host(&options);
    let res = host
        .handle(HttpRequest::new(
            Method::GET,
            "/pets?active=true&flag=false&ids=%5B1%2C2%5D&name=rex",
        ))
        .await;
    assert_eq!(res.status, 200);
    let query = &res.body["query"];
    assert_eq!(query["active"], json!(true));
    assert_eq!(query["flag"], json!(false));
    assert_eq!(query["ids"], json!([1, 2]));
    assert_eq!(query["name"], "rex");
}

#[tokio::test]
async fn undeclared_query_values_stay_strings_without_json_query() {
    let (host, _) = pet_host(&EngineOptions::default());
    let res = host
        .handle(HttpRequest::new(Method::GET, "/pets?flag=false"))
        .await;
    assert_eq!(res.body["query"]["flag"], "false");
}

#[tokio::test]
async fn headers_are_matched_case_insensitively() {
    let (host, _) = pet_host(&EngineOptions::default());
    let req = HttpRequest::new(Method::PUT, "/pets/7?dryRun=true")
        .header("X-Tenant", "acme")
        .json(json!({"name": "Rex"}));
    let res = host.handle(req).await;
    assert_eq!(res.status, 200);
    assert_eq!(
        res.body,
        json!({"id": "7", "tenant": "acme", "dryRun": true, "name": "Rex"})
    );
}

#[tokio::test]
async fn headers_fail_before_query_and_body() {
    let (host, calls) = pet_host(&EngineOptions::default());
    let req = HttpRequest::new(Method::PUT, "/pets/7?dryRun=maybe").json(json!({}));
    let res = host.handle(req).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["part"], "headers");

    let req = HttpRequest::new(Method::PUT, "/pets/7?dryRun=maybe")
        .header("x-tenant", "acme")
        .json(json!({}));
    let res = host.handle(req).await;
    assert_eq!(res.body["part"], "query");

    let req = HttpRequest::new(Method::PUT, "/pets/7?dryRun=false")
        .header("x-tenant", "acme")
        .json(json!({}));
    let res = host.handle(req).await;
    assert_eq!(res.body["part"], "body");
    assert_eq!(call_count(&calls), 0);
}

#[tokio::test]
async fn response_headers_are_forwarded() {
    let (host, _) = pet_host(&EngineOptions::default());
    let res = host.handle(HttpRequest::new(Method::GET, "/pets/9")).await;
    assert_eq!(res.get_header("x-pet-id"), Some("9"));
}

#[tokio::test]
async fn malformed_response_fails_response_validation() {
    let options = EngineOptions::default().response_validation(true);
    let (host, _) = pet_host(&options);
    let req = HttpRequest::new(Method::POST, "/pets").json(json!({"name": "broken"}));
    match host.dispatch(req).await.map(|r| r.map_err(RequestFailure::into_error)) {
        Some(Err(RequestError::ResponseValidation { status, failure })) => {
            assert_eq!(status, 201);
            assert_eq!(failure.part.to_string(), "response");
        }
        other => panic!("expected response validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_response_passes_when_response_validation_is_off() {
    let (host, _) = pet_host(&EngineOptions::default());
    let req = HttpRequest::new(Method::POST, "/pets").json(json!({"name": "broken"}));
    let res = host.handle(req).await;
    assert_eq!(res.status, 201);
    assert_eq!(res.body, json!({"extra": 1}));
}

#[tokio::test]
async fn response_shape_is_chosen_by_exact_status() {
    let options = EngineOptions::default().response_validation(true);
    let (host, _) = pet_host(&options);
    let res = host.handle(HttpRequest::new(Method::GET, "/pets/missing")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["error"], "not found");

    let res = host.handle(HttpRequest::new(Method::DELETE, "/pets/3")).await;
    assert_eq!(res.status, 204);
}

#[tokio::test]
async fn missing_response_shape_fails_closed_by_default() {
    let options = EngineOptions::default().response_validation(true);
    let (host, _) = pet_host(&options);
    let req = HttpRequest::new(Method::PUT, "/pets/7")
        .header("x-tenant", "acme")
        .json(json!({"name": "Rex"}));
    match host.dispatch(req).await.map(|r| r.map_err(RequestFailure::into_error)) {
        Some(Err(RequestError::ResponseShapeMissing { status })) => assert_eq!(status, 200),
        other => panic!("expected missing shape error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_response_shape_can_pass_through() {
    let options = EngineOptions::default()
        .response_validation(true)
        .missing_response_shape(MissingResponseShape::PassThrough);
    let (host, _) = pet_host(&options);
    let req = HttpRequest::new(Method::PUT, "/pets/7")
        .header("x-tenant", "acme")
        .json(json!({"name": "Rex"}));
    let res = host.handle(req).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["name"], "Rex");
}

#[tokio::test]
async fn handler_errors_go_to_the_host_error_path() {
    let (host, _) = pet_host(&EngineOptions::default());
    match host.dispatch(HttpRequest::new(Method::GET, "/pets/explode")).await {
        Some(Err(failure)) => {
            assert_eq!(failure.key_path(), "pets.get");
            assert_eq!(failure.route().method, Method::GET);
            assert_eq!(failure.route().path, "/pets/{id}");
            assert!(!failure.context().has_value());
            assert_eq!(failure.status(), 500);
            match failure.error() {
                RequestError::Handler(e) => assert!(e.to_string().contains("storage unavailable")),
                other => panic!("expected handler error, got {other:?}"),
            }
        }
        other => panic!("expected handler error, got {other:?}"),
    }

    let res = host.handle(HttpRequest::new(Method::GET, "/pets/explode")).await;
    assert_eq!(res.status, 500);
}

#[tokio::test]
async fn out_of_range_status_is_a_handler_error() {
    let (host, _) = pet_host(&EngineOptions::default());
    let res = host.dispatch(HttpRequest::new(Method::GET, "/pets/teapot")).await;
    match res {
        Some(Err(failure)) => assert!(matches!(failure.error(), RequestError::Handler(_))),
        other => panic!("expected handler error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_handler_sees_the_failing_route() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut host = MemoryRouter::new().with_error_handler(|failure| {
        HttpResponse::json(
            503,
            json!({
                "route": failure.key_path(),
                "path": failure.route().path,
                "error": failure.error().to_string(),
            }),
        )
    });
    register(&mut host, &pet_contract(), &pet_impl(calls), &EngineOptions::default()).unwrap();

    let res = host.handle(HttpRequest::new(Method::GET, "/pets/explode")).await;
    assert_eq!(res.status, 503);
    assert_eq!(res.body["route"], "pets.get");
    assert_eq!(res.body["path"], "/pets/{id}");
    assert!(res.body["error"]
        .as_str()
        .is_some_and(|e| e.contains("storage unavailable")));

    // successful requests never reach the error handler
    let res = host.handle(HttpRequest::new(Method::GET, "/pets/3")).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn percent_encoded_path_params_are_decoded() {
    let (host, _) = pet_host(&EngineOptions::default());
    let res = host.handle(HttpRequest::new(Method::GET, "/pets/rex%20jr")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "rex jr");
    assert_eq!(res.get_header("x-pet-id"), Some("rex jr"));
}

#[tokio::test]
async fn unmatched_requests_get_404() {
    let (host, _) = pet_host(&EngineOptions::default());
    assert!(host.dispatch(HttpRequest::new(Method::GET, "/cats")).await.is_none());
    let res = host.handle(HttpRequest::new(Method::PATCH, "/pets/1")).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn custom_validation_error_handler_replaces_the_400() {
    let options = EngineOptions::default().validation_error_handler(|req, failure| {
        HttpResponse::json(
            422,
            json!({"path": req.path, "part": failure.part, "count": failure.issues.len()}),
        )
    });
    let (host, calls) = pet_host(&options);
    let res = host
        .handle(HttpRequest::new(Method::POST, "/pets").json(json!({})))
        .await;
    assert_eq!(res.status, 422);
    assert_eq!(res.body["path"], "/pets");
    assert_eq!(res.body["part"], "body");
    assert_eq!(call_count(&calls), 0);
}
