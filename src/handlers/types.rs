use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::middleware::Middleware;
use crate::server::{HeaderVec, HttpRequest, UploadedFile};

/// Everything a route implementation gets to see
///
/// Only validated values are exposed as first-class fields. `request` is the
/// escape hatch for host-specific needs; `files` are passed through without
/// validation.
#[derive(Debug, Clone)]
pub struct RouteInput {
    /// Path parameters after coercion and validation
    pub params: Value,
    /// Query object after decoding and validation
    pub query: Value,
    /// Header object after validation (lowercase names)
    pub headers: Value,
    /// Request body after validation (`Null` when absent)
    pub body: Value,
    /// Uploaded files, unvalidated
    pub files: Vec<UploadedFile>,
    /// Context attached by the binder
    pub context: RequestContext,
    /// The raw request
    pub request: Arc<HttpRequest>,
}

/// What a route implementation returns
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutput {
    /// HTTP status; also selects the response shape when response validation is on
    pub status: u16,
    /// JSON body
    pub body: Value,
    /// Extra response headers
    pub headers: HeaderVec,
}

impl RouteOutput {
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            headers: HeaderVec::new(),
        }
    }

    /// Serialise any `Serialize` value as the body
    pub fn from_serialize<T: Serialize>(status: u16, body: &T) -> serde_json::Result<Self> {
        Ok(Self::json(status, serde_json::to_value(body)?))
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }
}

type HandlerFn = dyn Fn(RouteInput) -> BoxFuture<'static, anyhow::Result<RouteOutput>> + Send + Sync;

/// Type-erased asynchronous route implementation
#[derive(Clone)]
pub struct RouteHandler(Arc<HandlerFn>);

impl RouteHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(RouteInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<RouteOutput>> + Send + 'static,
    {
        Self(Arc::new(move |input| f(input).boxed()))
    }

    pub async fn call(&self, input: RouteInput) -> anyhow::Result<RouteOutput> {
        (self.0)(input).await
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RouteHandler")
    }
}

/// Implementation of one route: a handler plus route-level middleware
#[derive(Clone)]
pub struct RouteImpl {
    pub handler: RouteHandler,
    pub middleware: Vec<Arc<dyn Middleware>>,
}

impl RouteImpl {
    #[must_use]
    pub fn new(handler: RouteHandler) -> Self {
        Self {
            handler,
            middleware: Vec::new(),
        }
    }

    /// Append a route-level middleware (runs after global middleware)
    #[must_use]
    pub fn middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middleware.push(mw);
        self
    }
}

impl From<RouteHandler> for RouteImpl {
    fn from(handler: RouteHandler) -> Self {
        Self::new(handler)
    }
}

impl fmt::Debug for RouteImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteImpl")
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// A node of an implementation tree
#[derive(Debug, Clone)]
pub enum ImplNode {
    /// Leaf: implements one contract route
    Route(RouteImpl),
    /// Mirrors a nested contract router
    Router(ImplTree),
}

impl From<RouteHandler> for ImplNode {
    fn from(handler: RouteHandler) -> Self {
        ImplNode::Route(RouteImpl::new(handler))
    }
}

impl From<RouteImpl> for ImplNode {
    fn from(route: RouteImpl) -> Self {
        ImplNode::Route(route)
    }
}

impl From<ImplTree> for ImplNode {
    fn from(tree: ImplTree) -> Self {
        ImplNode::Router(tree)
    }
}

/// Implementation tree mirroring a [`crate::spec::ContractRouter`]
///
/// Keys keep insertion order; registration walks them in that order.
#[derive(Debug, Clone, Default)]
pub struct ImplTree {
    children: Vec<(String, ImplNode)>,
}

impl ImplTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add any node under `key`, replacing an existing entry
    #[must_use]
    pub fn node(mut self, key: impl Into<String>, node: impl Into<ImplNode>) -> Self {
        let key = key.into();
        let node = node.into();
        match self.children.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = node,
            None => self.children.push((key, node)),
        }
        self
    }

    /// Implement a route with an async function
    #[must_use]
    pub fn handle<F, Fut>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(RouteInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<RouteOutput>> + Send + 'static,
    {
        self.node(key, RouteHandler::new(f))
    }

    /// Implement a route with a handler and route-level middleware
    #[must_use]
    pub fn route(self, key: impl Into<String>, route: RouteImpl) -> Self {
        self.node(key, route)
    }

    #[must_use]
    pub fn nest(self, key: impl Into<String>, tree: ImplTree) -> Self {
        self.node(key, tree)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImplNode)> {
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
    pub fn contains_key(&self, key: &str) -> bool {
        self.children.iter().any(|(k, _)| k == key)
    }
}
