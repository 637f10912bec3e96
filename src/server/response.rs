use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;

/// Maximum inline response headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 8;

/// Response header storage
pub type HeaderVec = SmallVec<[(String, String); MAX_INLINE_HEADERS]>;

/// Response handed back to the host router
///
/// The body is always JSON; `content-type: application/json` is set by the
/// constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// JSON body
    pub body: Value,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with the content type header set
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// `{"error": message}` with the given status
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_ascii_lowercase(), value));
    }

    /// Serialised body bytes as they go on the wire
    pub fn body_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.body)
    }
}
