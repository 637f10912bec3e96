use std::time::Duration;

use tracing::{debug, info};

use super::Middleware;
use crate::error::RequestError;
use crate::server::{HttpRequest, HttpResponse};

/// Logs one event when a request enters the chain and one when it leaves
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn before(&self, req: &HttpRequest) -> Option<HttpResponse> {
        let route = req.context().map(|c| c.route().path.as_str()).unwrap_or("");
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            route = %route,
            "request started"
        );
        None
    }

    fn after(&self, req: &HttpRequest, res: &mut HttpResponse, latency: Duration) {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            status = res.status,
            latency_ms = latency.as_millis() as u64,
            "request completed"
        );
    }

    fn on_error(&self, req: &HttpRequest, error: &RequestError, latency: Duration) {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            status = error.status(),
            error = %error,
            latency_ms = latency.as_millis() as u64,
            "request failed"
        );
    }
}
