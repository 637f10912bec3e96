//! # Validator Module
//!
//! Uniform adapter over the `jsonschema` crate: `validate(value, shape)` gives
//! back either the parsed value or the library's error detail.
//!
//! Two modes exist:
//!
//! - **Tolerant** for path parameters, headers and the query string. Extra keys
//!   are fine (hosts add their own headers, routers may capture more params
//!   than a route declares) and string inputs are coerced to the declared
//!   primitive types first.
//! - **Strict** for request bodies and response bodies. Object shapes that
//!   state neither `additionalProperties` nor `unevaluatedProperties` reject
//!   unknown keys, including shapes built from `$ref` and `allOf`.
//!
//! ```rust
//! use contract_router::validator::{validate, RequestPart, ValidationMode};
//! use serde_json::json;
//!
//! let shape = json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string"}},
//!     "required": ["name"]
//! });
//!
//! assert!(validate(json!({"name": "Rex"}), &shape, ValidationMode::Strict, RequestPart::Body).is_ok());
//! assert!(validate(json!({}), &shape, ValidationMode::Strict, RequestPart::Body).is_err());
//! ```

mod coerce;
mod core;

pub use coerce::{coerce_string_map, decode_param_value, query_object};
pub use core::{
    strict_shape, validate, CompiledShape, RequestPart, ValidationFailure, ValidationIssue,
    ValidationMode, ValidationOutcome,
};
