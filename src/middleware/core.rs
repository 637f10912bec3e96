use std::time::Duration;

use crate::error::RequestError;
use crate::server::{HttpRequest, HttpResponse};

/// Hooks around a route's handler
///
/// `before` runs in chain order once the request context is bound. Returning
/// `Some(response)` ends the request: later middleware, validation and the
/// handler are skipped and the response goes straight to the host. For every
/// middleware whose `before` ran, exactly one of `after` (the chain produced a
/// response) or `on_error` (the chain failed with a [`RequestError`]) runs,
/// in reverse order, with the time spent since that middleware's `before`.
pub trait Middleware: Send + Sync {
    /// Label used in log events
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
    fn before(&self, _req: &HttpRequest) -> Option<HttpResponse> {
        None
    }
    fn after(&self, _req: &HttpRequest, _res: &mut HttpResponse, _latency: Duration) {}
    fn on_error(&self, _req: &HttpRequest, _error: &RequestError, _latency: Duration) {}
}
