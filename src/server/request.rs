use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;

use crate::context::RequestContext;
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Maximum number of query pairs kept inline before heap allocation
pub const MAX_INLINE_QUERY: usize = 8;

/// Ordered query string pairs; repeated keys are kept as separate entries
pub type QueryVec = SmallVec<[(String, String); MAX_INLINE_QUERY]>;

/// A file attached to a multipart request by the host
///
/// Files are passed through to handlers untouched; they are never validated
/// against a contract shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under
    pub field: String,
    /// Client supplied file name
    pub filename: Option<String>,
    /// Declared media type
    pub content_type: Option<String>,
    /// Raw file content
    pub data: Arc<[u8]>,
}

/// Inbound request as delivered by the host router
///
/// The host fills in the method, the concrete path, path parameters it
/// extracted while matching, the query string pairs, headers (lowercase
/// names) and a JSON body if one was sent. The context binder later attaches
/// a [`RequestContext`] to it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Correlation id (taken from `x-request-id` when valid)
    pub request_id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Concrete request path without the query string
    pub path: String,
    /// Path parameters extracted by the host
    pub path_params: HashMap<String, String>,
    /// Query string pairs in wire order
    pub query: QueryVec,
    /// Headers with lowercase names
    pub headers: HashMap<String, String>,
    /// Parsed JSON body
    pub body: Option<Value>,
    /// Uploaded files
    pub files: Vec<UploadedFile>,
    context: Option<RequestContext>,
}

impl HttpRequest {
    /// Build a request from a method and a path that may carry a query string
    pub fn new(method: Method, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, parse_query_string(q)),
            None => (path_and_query, QueryVec::new()),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            path_params: HashMap::new(),
            query,
            headers: HashMap::new(),
            body: None,
            files: Vec::new(),
            context: None,
        }
    }

    /// Set a header (name is lowercased); `x-request-id` also sets the request id
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == REQUEST_ID_HEADER {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Header lookup, case-insensitive
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Query lookup with "last write wins" semantics for repeated keys
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Context attached by the binder, if the request went through a chain
    #[must_use]
    pub fn context(&self) -> Option<&RequestContext> {
        self.context.as_ref()
    }

    pub(crate) fn attach_context(&mut self, context: RequestContext) {
        self.context = Some(context);
    }
}

/// Parse a raw query string into ordered, percent-decoded pairs
#[must_use]
pub fn parse_query_string(query: &str) -> QueryVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
