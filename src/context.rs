//! # Context Binder
//!
//! A contract router may declare a context function: given the incoming
//! request and the matched route it computes a per-request value (a tenant, a
//! session, a database handle...). The binder is always the first stage of a
//! route's handler chain. It runs before middleware and before validation, and
//! it attaches a [`RequestContext`] to the request unconditionally:
//!
//! - with a context function, the context carries its resolved value;
//! - without one, the context still exists and carries an explicit "no
//!   context" value together with the matched route, so error handlers can
//!   always see which route was hit.
//!
//! Values are computed fresh for every request and never shared.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::error::RequestError;
use crate::server::HttpRequest;
use crate::spec::Route;

/// Opaque context value produced by a context function
pub type ContextValue = Arc<dyn Any + Send + Sync>;

type ContextFnInner =
    dyn Fn(&HttpRequest, &Route) -> BoxFuture<'static, anyhow::Result<ContextValue>> + Send + Sync;

/// Type-erased, possibly asynchronous context function
#[derive(Clone)]
pub struct ContextFn(Arc<ContextFnInner>);

impl ContextFn {
    /// Wrap a function returning a future of any `Send + Sync` value
    pub fn new<F, Fut, T>(f: F) -> Self
    where
        F: Fn(&HttpRequest, &Route) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + Sync + 'static,
    {
        Self(Arc::new(move |req: &HttpRequest, route: &Route| {
            f(req, route)
                .map(|res| res.map(|v| Arc::new(v) as ContextValue))
                .boxed()
        }))
    }

    /// Run the function for one request
    pub async fn call(&self, req: &HttpRequest, route: &Route) -> anyhow::Result<ContextValue> {
        (self.0)(req, route).await
    }
}

impl fmt::Debug for ContextFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextFn")
    }
}

/// Per-request context attached by the binder
#[derive(Clone)]
pub struct RequestContext {
    route: Arc<Route>,
    value: Option<ContextValue>,
}

impl RequestContext {
    /// Context for a route whose router declares no context function
    #[must_use]
    pub fn none(route: Arc<Route>) -> Self {
        Self { route, value: None }
    }

    #[must_use]
    pub fn with_value(route: Arc<Route>, value: ContextValue) -> Self {
        Self {
            route,
            value: Some(value),
        }
    }

    /// The matched route
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// `false` when the router declared no context function
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Typed access to the context value
    ///
    /// Returns `None` both for the "no context" marker and for a type mismatch.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Shared handle to the raw value
    #[must_use]
    pub fn value(&self) -> Option<ContextValue> {
        self.value.clone()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.route.method)
            .field("path", &self.route.path)
            .field("has_value", &self.value.is_some())
            .finish()
    }
}

/// First stage of every handler chain
#[derive(Debug, Clone)]
pub struct ContextBinder {
    route: Arc<Route>,
    context_fn: Option<ContextFn>,
}

impl ContextBinder {
    #[must_use]
    pub fn new(route: Arc<Route>, context_fn: Option<ContextFn>) -> Self {
        Self { route, context_fn }
    }

    /// Compute and attach the context for `req`
    ///
    /// A failing context function is reported as [`RequestError::Context`];
    /// the "no context" marker is attached first so the host's error path can
    /// still see the matched route.
    pub async fn bind(&self, req: &mut HttpRequest) -> Result<(), RequestError> {
        req.attach_context(RequestContext::none(Arc::clone(&self.route)));
        let Some(context_fn) = &self.context_fn else {
            return Ok(());
        };
        let value = context_fn
            .call(req, &self.route)
            .await
            .map_err(RequestError::Context)?;
        debug!(
            request_id = %req.request_id,
            path = %self.route.path,
            "Request context bound"
        );
        req.attach_context(RequestContext::with_value(Arc::clone(&self.route), value));
        Ok(())
    }
}
