//! # Registry Module
//!
//! Binds an implementation tree to a contract and registers the result with a
//! host router.
//!
//! [`walk`] pairs every implementation leaf with its contract route, following
//! the implementation's key order and inheriting context functions from the
//! nearest router that declares one. [`register`] turns each pair into a
//! [`crate::dispatcher::HandlerChain`] and hands it to the host under the
//! route's method and verbatim path.
//!
//! Registration is all or nothing: structural mismatches, unknown or missing
//! keys, unsupported methods and shapes that do not compile are all reported
//! before the host is called.

mod register;
mod walk;

pub use register::{register, RegisteredRoute};
pub use walk::{walk, BoundRoute};
