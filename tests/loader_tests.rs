//! Loading contracts from YAML and JSON documents

use std::io::Write;

use contract_router::handlers::{ImplTree, RouteOutput};
use contract_router::registry::register;
use contract_router::router::MemoryRouter;
use contract_router::runtime_config::EngineOptions;
use contract_router::server::HttpRequest;
use contract_router::spec::{load_contract, ContractNode};
use http::Method;
use serde_json::json;
use tempfile::Builder;

const PET_STORE_YAML: &str = r#"
x-owner: platform team
health:
  method: GET
  path: /health
  summary: Liveness probe
  responses:
    200:
      type: object
      properties:
        ok: { type: boolean }
pets:
  list:
    method: get
    path: /pets
    query:
      type: object
      properties:
        limit: { type: integer, minimum: 1 }
    responses:
      200:
        type: object
        properties:
          limit: { type: integer }
  create:
    method: POST
    path: /pets
    body:
      type: object
      properties:
        name: { type: string }
      required: [name]
    responses:
      201:
        type: object
        properties:
          name: { type: string }
"#;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn yaml_contract_keeps_document_order() {
    let file = write_temp(".yaml", PET_STORE_YAML);
    let contract = load_contract(file.path()).unwrap();

    let keys: Vec<String> = contract.routes().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["health", "pets.list", "pets.create"]);
    assert!(contract.get("x-owner").is_none());
    assert!(matches!(contract.get("pets"), Some(ContractNode::Router(_))));

    let health = contract.find("health").unwrap();
    assert_eq!(health.summary.as_deref(), Some("Liveness probe"));
    assert!(health.response_shape(200).is_some());

    let list = contract.find("pets.list").unwrap();
    assert_eq!(list.method, Method::GET);
    assert!(list.body.is_none());
}

#[test]
fn json_contract_loads() {
    let doc = json!({
        "users": {
            "get": {
                "method": "GET",
                "path": "/users/{id}",
                "responses": {"200": {"type": "object"}}
            }
        }
    });
    let file = write_temp(".json", &doc.to_string());
    let contract = load_contract(file.path()).unwrap();
    let route = contract.find("users.get").unwrap();
    assert_eq!(route.path, "/users/{id}");
    assert_eq!(route.path_params["required"], json!(["id"]));
}

#[test]
fn invalid_method_names_the_route() {
    let file = write_temp(".yaml", "ping:\n  method: \"GE T\"\n  path: /ping\n");
    let err = load_contract(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("'ping' has an invalid method"));
}

#[test]
fn route_at_the_root_is_rejected() {
    let file = write_temp(".yml", "method: GET\npath: /\n");
    let err = load_contract(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("contract root must be a router"));
}

#[test]
fn missing_file_is_reported() {
    let err = load_contract("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("failed to read contract"));
}

#[tokio::test]
async fn loaded_contract_serves_requests() {
    let file = write_temp(".yaml", PET_STORE_YAML);
    let contract = load_contract(file.path()).unwrap();
    let implementation = ImplTree::new()
        .handle("health", |_| async {
            Ok(RouteOutput::json(200, json!({"ok": true})))
        })
        .nest(
            "pets",
            ImplTree::new()
                .handle("list", |input| async move {
                    Ok(RouteOutput::json(200, json!({"limit": input.query["limit"]})))
                })
                .handle("create", |input| async move {
                    Ok(RouteOutput::json(201, input.body))
                }),
        );

    let mut host = MemoryRouter::new();
    let options = EngineOptions::default().response_validation(true);
    register(&mut host, &contract, &implementation, &options).unwrap();

    let res = host.handle(HttpRequest::new(Method::GET, "/pets?limit=3")).await;
    assert_eq!(res.body, json!({"limit": 3}));

    let res = host
        .handle(HttpRequest::new(Method::POST, "/pets").json(json!({"name": "Rex"})))
        .await;
    assert_eq!(res.status, 201);

    let res = host.handle(HttpRequest::new(Method::GET, "/health")).await;
    assert_eq!(res.body, json!({"ok": true}));
}
