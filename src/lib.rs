//! # contract-router
//!
//! **contract-router** binds a declarative API contract to route
//! implementations. The contract is a tree of routers whose leaves are routes
//! (method, path, and JSON Schema shapes for path params, headers, query, body
//! and each response status). The implementation tree mirrors it key for key.
//! At startup the two trees are checked against each other and one handler
//! chain per route is registered with a host router. At request time each
//! chain binds a per-request context, runs middleware, validates the request
//! and calls the implementation with the validated values only.
//!
//! ## Architecture
//!
//! - **[`spec`]** - the contract model (`Route`, `ContractRouter`) and the YAML/JSON loader
//! - **[`handlers`]** - the implementation tree and handler types
//! - **[`registry`]** - the tree walker and route registration
//! - **[`context`]** - the per-request context binder
//! - **[`dispatcher`]** - the handler chain and the validation pipeline
//! - **[`validator`]** - the schema validation adapter (tolerant and strict modes)
//! - **[`validator_cache`]** - validators compiled once per distinct shape
//! - **[`middleware`]** - the middleware trait and built-in middleware
//! - **[`router`]** - the host router seam and the in-process `MemoryRouter`
//! - **[`server`]** - request and response values exchanged with the host
//! - **[`runtime_config`]** - engine options from code, environment or YAML
//!
//! ### Registration Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Registry as registry::register
//!     participant Walker as registry::walk
//!     participant Cache as ValidatorCache
//!     participant Host as HostRouter
//!
//!     App->>Registry: register(host, contract, implementation, options)
//!     Registry->>Walker: walk(contract, implementation)
//!     Walker-->>Registry: Vec<BoundRoute> or ContractError
//!     Registry->>Cache: compile_route(key, route) for every route
//!     Cache-->>Registry: RouteValidators or ContractError
//!     Registry->>Host: get/post/put/patch/delete(path, HandlerChain)
//!     Registry-->>App: Vec<RegisteredRoute>
//! ```
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host router
//!     participant Ctx as ContextBinder
//!     participant MW as Middleware
//!     participant EP as RouteEndpoint
//!     participant Handler as Route handler
//!
//!     Host->>Ctx: matched request
//!     Ctx->>Ctx: attach RequestContext
//!     Ctx->>MW: before()
//!     alt middleware answers
//!         MW-->>Host: early response
//!     end
//!     MW->>EP: request
//!     EP->>EP: validate params, headers, query, body
//!     alt validation fails
//!         EP-->>Host: 400 {"part", "issues"}
//!     end
//!     EP->>Handler: RouteInput
//!     Handler-->>EP: RouteOutput
//!     EP->>EP: validate response (optional)
//!     EP-->>MW: after()
//!     MW-->>Host: JSON response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use contract_router::handlers::{ImplTree, RouteOutput};
//! use contract_router::registry::register;
//! use contract_router::router::MemoryRouter;
//! use contract_router::runtime_config::EngineOptions;
//! use contract_router::server::HttpRequest;
//! use contract_router::spec::{ContractRouter, Route};
//! use serde_json::json;
//!
//! let contract = ContractRouter::new().nest(
//!     "pets",
//!     ContractRouter::new().route(
//!         "create",
//!         Route::post("/pets")
//!             .body(json!({
//!                 "type": "object",
//!                 "properties": {"name": {"type": "string"}},
//!                 "required": ["name"]
//!             }))
//!             .response(201, json!({
//!                 "type": "object",
//!                 "properties": {"name": {"type": "string"}}
//!             })),
//!     ),
//! );
//!
//! let implementation = ImplTree::new().nest(
//!     "pets",
//!     ImplTree::new().handle("create", |input| async move {
//!         Ok(RouteOutput::json(201, json!({"name": input.body["name"]})))
//!     }),
//! );
//!
//! let mut host = MemoryRouter::new();
//! let options = EngineOptions::default().response_validation(true);
//! register(&mut host, &contract, &implementation, &options).unwrap();
//!
//! let req = HttpRequest::new(http::Method::POST, "/pets").json(json!({"name": "Rex"}));
//! let res = futures::executor::block_on(host.handle(req));
//! assert_eq!(res.status, 201);
//!
//! let req = HttpRequest::new(http::Method::POST, "/pets").json(json!({}));
//! let res = futures::executor::block_on(host.handle(req));
//! assert_eq!(res.status, 400);
//! ```
//!
//! ## Runtime Considerations
//!
//! Contract and implementation trees are immutable after registration and
//! shared by all requests. The only per-request state is the context attached
//! to the request itself. The engine spawns nothing and does not time out or
//! cancel handlers; that belongs to the host.

pub mod cli;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod spec;
pub mod validator;
pub mod validator_cache;

pub use error::{ContractError, NodeKind, RequestError, RequestFailure};
pub use handlers::{ImplTree, RouteImpl, RouteInput, RouteOutput};
pub use registry::{register, RegisteredRoute};
pub use runtime_config::{EngineOptions, MissingResponseShape};
pub use spec::{load_contract, ContractRouter, Route};
