//! # Handlers Module
//!
//! The implementation side of a contract. An [`ImplTree`] mirrors a
//! [`crate::spec::ContractRouter`] key for key: every contract route is
//! implemented by a [`RouteImpl`] (a bare handler or a handler with route-level
//! middleware), every nested contract router by a nested `ImplTree`.
//!
//! ```rust
//! use contract_router::handlers::{ImplTree, RouteOutput};
//! use serde_json::json;
//!
//! let implementation = ImplTree::new().nest(
//!     "pets",
//!     ImplTree::new().handle("get", |input| async move {
//!         Ok(RouteOutput::json(200, json!({"id": input.params["id"]})))
//!     }),
//! );
//! assert_eq!(implementation.len(), 1);
//! ```

mod typed;
mod types;

pub use typed::{typed, Typed};
pub use types::{ImplNode, ImplTree, RouteHandler, RouteImpl, RouteInput, RouteOutput};
