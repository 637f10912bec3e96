//! Typed handlers: deserialise validated request parts into Rust types.
//!
//! The pipeline has already validated params, query and body against the
//! contract when a handler runs, so deserialisation only fails when the Rust
//! types and the declared shapes disagree. Such a failure is a programming
//! error and is reported through the handler error path (500 by default), not
//! as a 400.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{RouteHandler, RouteInput, RouteOutput};
use crate::context::RequestContext;
use crate::server::{HttpRequest, UploadedFile};

/// Typed view of a [`RouteInput`]
///
/// Parts a handler does not care about can stay as `serde_json::Value`.
#[derive(Debug, Clone)]
pub struct Typed<P, Q = Value, B = Value> {
    pub params: P,
    pub query: Q,
    pub body: B,
    pub headers: Value,
    pub files: Vec<UploadedFile>,
    pub context: RequestContext,
    pub request: Arc<HttpRequest>,
}

impl<P, Q, B> TryFrom<RouteInput> for Typed<P, Q, B>
where
    P: DeserializeOwned,
    Q: DeserializeOwned,
    B: DeserializeOwned,
{
    type Error = anyhow::Error;

    fn try_from(input: RouteInput) -> Result<Self, Self::Error> {
        Ok(Typed {
            params: serde_json::from_value(input.params).context("path params do not match handler type")?,
            query: serde_json::from_value(input.query).context("query does not match handler type")?,
            body: serde_json::from_value(input.body).context("body does not match handler type")?,
            headers: input.headers,
            files: input.files,
            context: input.context,
            request: input.request,
        })
    }
}

/// Adapt an async function over [`Typed`] into a [`RouteHandler`]
///
/// ```rust
/// use contract_router::handlers::{typed, RouteOutput, Typed};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct PetParams {
///     id: String,
/// }
///
/// let handler = typed(|req: Typed<PetParams>| async move {
///     Ok(RouteOutput::json(200, json!({"id": req.params.id})))
/// });
/// # let _ = handler;
/// ```
pub fn typed<P, Q, B, F, Fut>(f: F) -> RouteHandler
where
    P: DeserializeOwned + Send + 'static,
    Q: DeserializeOwned + Send + 'static,
    B: DeserializeOwned + Send + 'static,
    F: Fn(Typed<P, Q, B>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<RouteOutput>> + Send + 'static,
{
    let f = Arc::new(f);
    RouteHandler::new(move |input: RouteInput| {
        let f = Arc::clone(&f);
        async move {
            let req = Typed::<P, Q, B>::try_from(input)?;
            f(req).await
        }
    })
}
