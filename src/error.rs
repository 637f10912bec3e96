//! Error types for contract registration and request handling.
//!
//! Two families exist and they never mix:
//!
//! - [`ContractError`] is raised while binding a contract to its implementation.
//!   Every variant is fatal for the whole registration: the walker checks the
//!   entire tree before the host sees a single handler chain.
//! - [`RequestError`] is raised while serving one request. A handler chain
//!   hands it to the host's generic error path wrapped in a [`RequestFailure`],
//!   which also names the matched route. Request validation failures are
//!   *not* errors; they terminate the request with a 400 response instead.

use std::fmt;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::spec::Route;
use crate::validator::ValidationFailure;

/// Node kind used in structural mismatch reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A leaf route
    Route,
    /// A nested router
    Router,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Route => write!(f, "route"),
            NodeKind::Router => write!(f, "router"),
        }
    }
}

/// Startup error returned by [`crate::registry::register`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Contract and implementation disagree on node kind at `key_path`
    ///
    /// `expected` is what the implementation tree supplied, `found` is what the
    /// contract declares.
    StructuralMismatch {
        /// Dotted key path of the offending node (e.g. `pets.get`)
        key_path: String,
        /// Kind supplied by the implementation tree
        expected: NodeKind,
        /// Kind declared by the contract
        found: NodeKind,
    },
    /// The contract declares a node that the implementation does not provide
    MissingImplementation {
        /// Dotted key path of the unimplemented node
        key_path: String,
    },
    /// The implementation provides a key the contract does not declare
    UnknownRoute {
        /// Dotted key path of the extra implementation node
        key_path: String,
    },
    /// The route's method is not one of GET, POST, PUT, PATCH, DELETE
    UnsupportedMethod {
        /// Dotted key path of the route
        key_path: String,
        /// The declared method
        method: String,
    },
    /// The host cannot route the declared path pattern
    InvalidPath {
        /// Dotted key path of the route
        key_path: String,
        /// The declared path
        path: String,
        /// Why the host rejected it
        message: String,
    },
    /// A declared shape could not be compiled by the schema library
    InvalidSchema {
        /// Dotted key path of the route
        key_path: String,
        /// Which part of the route carries the shape (e.g. `body`, `response 200`)
        part: String,
        /// Compiler message
        message: String,
    },
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractError::StructuralMismatch {
                key_path,
                expected,
                found,
            } => write!(
                f,
                "structural mismatch at '{}': {} expected, {} schema found",
                key_path, expected, found
            ),
            ContractError::MissingImplementation { key_path } => {
                write!(f, "no implementation supplied for contract node '{}'", key_path)
            }
            ContractError::UnknownRoute { key_path } => {
                write!(f, "implementation node '{}' has no contract counterpart", key_path)
            }
            ContractError::UnsupportedMethod { key_path, method } => write!(
                f,
                "route '{}' declares unsupported method {} (expected GET, POST, PUT, PATCH or DELETE)",
                key_path, method
            ),
            ContractError::InvalidPath {
                key_path,
                path,
                message,
            } => write!(f, "route '{}' has an invalid path '{}': {}", key_path, path, message),
            ContractError::InvalidSchema {
                key_path,
                part,
                message,
            } => write!(
                f,
                "route '{}' has an invalid {} shape: {}",
                key_path, part, message
            ),
        }
    }
}

impl std::error::Error for ContractError {}

/// Per-request error forwarded to the host's generic error pipeline
#[derive(Debug)]
pub enum RequestError {
    /// The route implementation failed
    Handler(anyhow::Error),
    /// The router's context function failed
    Context(anyhow::Error),
    /// The handler's body does not match the declared response shape
    ResponseValidation {
        /// Status returned by the handler
        status: u16,
        /// Validator detail
        failure: ValidationFailure,
    },
    /// Response validation is on and no shape is declared for this status
    ResponseShapeMissing {
        /// Status returned by the handler
        status: u16,
    },
    /// The handler output could not be turned into JSON
    Serialization(serde_json::Error),
}

impl RequestError {
    /// HTTP status a host should use when it has no better mapping
    #[must_use]
    pub fn status(&self) -> u16 {
        500
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Handler(e) => write!(f, "handler failed: {e}"),
            RequestError::Context(e) => write!(f, "context computation failed: {e}"),
            RequestError::ResponseValidation { status, failure } => write!(
                f,
                "response for status {} failed validation: {}",
                status, failure
            ),
            RequestError::ResponseShapeMissing { status } => {
                write!(f, "no response shape declared for status {}", status)
            }
            RequestError::Serialization(e) => write!(f, "response serialization failed: {e}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Handler(e) | RequestError::Context(e) => Some(e.as_ref()),
            RequestError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(e: serde_json::Error) -> Self {
        RequestError::Serialization(e)
    }
}

/// A [`RequestError`] together with the route whose chain raised it
///
/// The context is the one the binder attached, so it is present even when
/// the context function itself failed (it then carries no value).
#[derive(Debug)]
pub struct RequestFailure {
    key_path: Arc<str>,
    context: RequestContext,
    error: RequestError,
}

impl RequestFailure {
    #[must_use]
    pub fn new(key_path: Arc<str>, context: RequestContext, error: RequestError) -> Self {
        Self {
            key_path,
            context,
            error,
        }
    }

    /// Dotted contract key of the failing route
    #[must_use]
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    /// The matched route
    #[must_use]
    pub fn route(&self) -> &Route {
        self.context.route()
    }

    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    #[must_use]
    pub fn error(&self) -> &RequestError {
        &self.error
    }

    #[must_use]
    pub fn into_error(self) -> RequestError {
        self.error
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.error.status()
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let route = self.context.route();
        write!(
            f,
            "route '{}' ({} {}): {}",
            self.key_path, route.method, route.path, self.error
        )
    }
}

impl std::error::Error for RequestFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
