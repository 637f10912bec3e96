use serde_json::json;

use super::Middleware;
use crate::server::{HttpRequest, HttpResponse};

/// Rejects requests whose header does not carry an exact token
///
/// Defaults to the `authorization` header. Mismatches short-circuit with 401
/// before any validation runs.
pub struct HeaderTokenMiddleware {
    header: String,
    token: String,
}

impl HeaderTokenMiddleware {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            header: "authorization".to_string(),
            token: token.into(),
        }
    }

    /// Check a different header
    #[must_use]
    pub fn header(mut self, name: &str) -> Self {
        self.header = name.to_ascii_lowercase();
        self
    }
}

impl Middleware for HeaderTokenMiddleware {
    fn before(&self, req: &HttpRequest) -> Option<HttpResponse> {
        match req.get_header(&self.header) {
            Some(h) if h == self.token => None,
            _ => Some(HttpResponse::json(401, json!({ "error": "Unauthorized" }))),
        }
    }
}
