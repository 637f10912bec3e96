use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use super::build::{derive_path_params_shape, normalize_header_shape};
use crate::context::ContextFn;
use crate::server::HttpRequest;

/// A JSON Schema document describing the expected structure of a value
pub type Shape = Value;

/// Response shapes keyed by exact HTTP status code
pub type Responses = BTreeMap<u16, Shape>;

/// A single declared HTTP endpoint
///
/// `path_params` is always present: when a route does not declare it, it is
/// derived from the placeholders in `path` (see
/// [`derive_path_params_shape`]). `query`, `headers` and `body` are optional;
/// an absent shape means that part of the request is passed through without
/// structural checks.
#[derive(Debug, Clone)]
pub struct Route {
    /// HTTP method (registration only accepts GET, POST, PUT, PATCH, DELETE)
    pub method: Method,
    /// Path pattern with `{name}` or `:name` placeholders, registered verbatim
    pub path: String,
    /// Shape for path parameters
    pub path_params: Shape,
    /// Shape for the decoded query string
    pub query: Option<Shape>,
    /// Shape for request headers (property names lowercased)
    pub headers: Option<Shape>,
    /// Shape for the request body
    pub body: Option<Shape>,
    /// Response body shapes per status code
    pub responses: Responses,
    /// Free-form description, shown by the CLI route table
    pub summary: Option<String>,
}

impl Route {
    /// Create a route with a derived path parameter shape and nothing else declared
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            path_params: derive_path_params_shape(&path),
            path,
            query: None,
            headers: None,
            body: None,
            responses: Responses::new(),
            summary: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn path_params(mut self, shape: Shape) -> Self {
        self.path_params = shape;
        self
    }

    #[must_use]
    pub fn query(mut self, shape: Shape) -> Self {
        self.query = Some(shape);
        self
    }

    /// Declare the header shape; property names are lowercased
    #[must_use]
    pub fn headers(mut self, shape: Shape) -> Self {
        self.headers = Some(normalize_header_shape(shape));
        self
    }

    #[must_use]
    pub fn body(mut self, shape: Shape) -> Self {
        self.body = Some(shape);
        self
    }

    #[must_use]
    pub fn response(mut self, status: u16, shape: Shape) -> Self {
        self.responses.insert(status, shape);
        self
    }

    #[must_use]
    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }

    /// Shape declared for an exact status code (no wildcard or range fallback)
    #[must_use]
    pub fn response_shape(&self, status: u16) -> Option<&Shape> {
        self.responses.get(&status)
    }
}

/// A node of a contract tree
#[derive(Debug, Clone)]
pub enum ContractNode {
    /// Leaf endpoint
    Route(Arc<Route>),
    /// Nested collection of routes and routers
    Router(ContractRouter),
}

/// Named, possibly nested collection of routes
///
/// Children keep insertion order. Router-level options (the context function)
/// live in a dedicated field, so they can never collide with a route key.
#[derive(Clone, Default)]
pub struct ContractRouter {
    children: Vec<(String, ContractNode)>,
    context: Option<ContextFn>,
}

impl ContractRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a leaf route under `key`
    #[must_use]
    pub fn route(self, key: impl Into<String>, route: Route) -> Self {
        self.insert(key.into(), ContractNode::Route(Arc::new(route)))
    }

    /// Add (or replace) a nested router under `key`
    #[must_use]
    pub fn nest(self, key: impl Into<String>, router: ContractRouter) -> Self {
        self.insert(key.into(), ContractNode::Router(router))
    }

    /// Attach a per-request context function
    ///
    /// The function runs once per request, before any validation, for every
    /// route below this router that is not covered by a nearer router's own
    /// context function. Its resolved value is reachable from handlers through
    /// [`crate::context::RequestContext`].
    #[must_use]
    pub fn with_context<F, Fut, T>(mut self, f: F) -> Self
    where
        F: Fn(&HttpRequest, &Route) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + Sync + 'static,
    {
        self.context = Some(ContextFn::new(f));
        self
    }

    /// Attach an already wrapped context function
    #[must_use]
    pub fn with_context_fn(mut self, f: ContextFn) -> Self {
        self.context = Some(f);
        self
    }

    fn insert(mut self, key: String, node: ContractNode) -> Self {
        match self.children.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = node,
            None => self.children.push((key, node)),
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContractNode> {
        self.children
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Children in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContractNode)> {
        self.children.iter().map(|(k, n)| (k.as_str(), n))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[must_use]
    pub fn context(&self) -> Option<&ContextFn> {
        self.context.as_ref()
    }

    /// All leaf routes with their dotted key paths, depth first in insertion order
    #[must_use]
    pub fn routes(&self) -> Vec<(String, Arc<Route>)> {
        let mut out = Vec::new();
        self.collect_routes("", &mut out);
        out
    }

    /// Look up a leaf route by dotted key path (e.g. `pets.get`)
    #[must_use]
    pub fn find(&self, key_path: &str) -> Option<Arc<Route>> {
        let mut node = self;
        let mut parts = key_path.split('.').peekable();
        while let Some(part) = parts.next() {
            match node.get(part)? {
                ContractNode::Route(route) if parts.peek().is_none() => {
                    return Some(Arc::clone(route));
                }
                ContractNode::Router(child) => node = child,
                ContractNode::Route(_) => return None,
            }
        }
        None
    }

    fn collect_routes(&self, prefix: &str, out: &mut Vec<(String, Arc<Route>)>) {
        for (key, node) in &self.children {
            let path = join_key(prefix, key);
            match node {
                ContractNode::Route(route) => out.push((path, Arc::clone(route))),
                ContractNode::Router(child) => child.collect_routes(&path, out),
            }
        }
    }
}

impl fmt::Debug for ContractRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractRouter")
            .field("children", &self.children)
            .field("context", &self.context.is_some())
            .finish()
    }
}

pub(crate) fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
