//! # Contract Module
//!
//! Declarative description of an API: which routes exist, what they accept and
//! what they answer with. A contract is built once at startup (in code or from a
//! YAML/JSON document) and is read-only afterwards, so it can be shared by every
//! concurrent request without locking.
//!
//! ## Shape of a contract
//!
//! A [`ContractRouter`] maps string keys to [`ContractNode`]s, each of which is
//! either a leaf [`Route`] or another router. The variant is an explicit enum
//! tag, decided when the node is inserted.
//!
//! ```rust
//! use contract_router::spec::{ContractRouter, Route};
//! use serde_json::json;
//!
//! let contract = ContractRouter::new()
//!     .nest(
//!         "pets",
//!         ContractRouter::new()
//!             .route(
//!                 "get",
//!                 Route::get("/pets/{id}")
//!                     .response(200, json!({"type": "object"})),
//!             )
//!             .route(
//!                 "create",
//!                 Route::post("/pets")
//!                     .body(json!({
//!                         "type": "object",
//!                         "properties": {"name": {"type": "string"}},
//!                         "required": ["name"]
//!                     }))
//!                     .response(201, json!({"type": "object"})),
//!             ),
//!     );
//!
//! assert_eq!(contract.routes().len(), 2);
//! ```

mod build;
mod load;
mod types;

pub use build::{derive_path_params_shape, normalize_header_shape, path_param_names};
pub use load::{contract_from_value, load_contract};
pub use types::{ContractNode, ContractRouter, Responses, Route, Shape};
pub(crate) use types::join_key;
