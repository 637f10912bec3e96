use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::error::RequestError;
use crate::server::{HttpRequest, HttpResponse};

/// Request counters for the routes it is attached to
///
/// A request is counted when it enters; it is counted as completed (with its
/// latency and status class) once the chain either answers or fails. A chain
/// failure is recorded with the status the error maps to, so handler errors
/// show up as server errors. All counters are atomics updated with
/// `Ordering::Relaxed`; readings are eventually consistent.
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    completed_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that entered this middleware
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests that left the chain with a response or an error
    pub fn completed_count(&self) -> usize {
        self.completed_count.load(Ordering::Relaxed)
    }

    /// Mean latency of completed requests, zero before the first one
    pub fn average_latency(&self) -> Duration {
        let count = self.completed_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses with a 4xx status, validation rejections included
    pub fn client_errors(&self) -> usize {
        self.client_errors.load(Ordering::Relaxed)
    }

    /// Responses with a 5xx status and chain failures
    pub fn server_errors(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }

    fn record(&self, status: u16, latency: Duration) {
        self.total_latency_ns
            .fetch_add(u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX), Ordering::Relaxed);
        self.completed_count.fetch_add(1, Ordering::Relaxed);
        match status {
            400..=499 => {
                self.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                self.server_errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn before(&self, _req: &HttpRequest) -> Option<HttpResponse> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn after(&self, _req: &HttpRequest, res: &mut HttpResponse, latency: Duration) {
        self.record(res.status, latency);
    }

    fn on_error(&self, _req: &HttpRequest, error: &RequestError, latency: Duration) {
        self.record(error.status(), latency);
    }
}
