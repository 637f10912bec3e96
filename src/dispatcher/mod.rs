//! # Dispatcher Module
//!
//! Per-request execution of a registered route.
//!
//! ## Request Flow
//!
//! Every route is registered with the host as one [`HandlerChain`]:
//!
//! 1. the context binder attaches the request context
//! 2. global middleware, then route-level middleware, run `before`
//! 3. the [`RouteEndpoint`] validates path params, headers, query and body in
//!    that order; the first failure ends the request with a 400
//! 4. the route handler is awaited with the validated values
//! 5. the handler's output is checked against the declared response shape
//!    (when response validation is on) and serialised as JSON
//! 6. middleware `after` hooks run in reverse order, or `on_error` hooks when
//!    the chain failed
//!
//! ## Error Handling
//!
//! Validation failures are answered here. Everything else (a failing context
//! function or handler, a response that breaks its contract) is returned as a
//! [`crate::error::RequestFailure`] for the host's own error path. It wraps
//! the [`crate::error::RequestError`] together with the chain's key path and
//! the bound request context, so the host always knows which route failed.

mod core;

pub use core::{HandlerChain, RouteEndpoint, Stage, ValidatedParts};
