//! # Router Module
//!
//! The seam between the engine and the HTTP framework that owns routing.
//!
//! ## Overview
//!
//! - [`HostRouter`] is what registration talks to: one method-specific call
//!   per contract route, with the declared path pattern passed verbatim.
//! - [`MemoryRouter`] is a small in-process host. It compiles path patterns
//!   into regexes, extracts path parameters, runs the matching
//!   [`crate::dispatcher::HandlerChain`] and turns chain failures into JSON
//!   500 responses unless an error handler is set. Captured segments are
//!   percent-decoded. Its [`HostRouter::check_path`] rejects patterns without a
//!   leading `/` or with a repeated parameter name.
//!
//! ## Example
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
//! let contract = ContractRouter::new().route("health", Route::get("/health"));
//! let implementation = ImplTree::new().handle("health", |_input| async move {
//!     Ok(RouteOutput::json(200, json!({"ok": true})))
//! });
//!
//! let mut host = MemoryRouter::new();
//! register(&mut host, &contract, &implementation, &EngineOptions::default()).unwrap();
//!
//! let res = futures::executor::block_on(host.handle(HttpRequest::new(http::Method::GET, "/health")));
//! assert_eq!(res.status, 200);
//! ```

mod core;
mod host;
#[cfg(test)]
mod tests;

pub use core::{ErrorHandler, MemoryRouter};
pub use host::{register_method, HostRouter, SUPPORTED_METHODS};
