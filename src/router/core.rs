use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::Method;
use regex::Regex;
use tracing::{debug, info, warn};

use super::host::HostRouter;
use crate::dispatcher::HandlerChain;
use crate::error::RequestFailure;
use crate::server::{HttpRequest, HttpResponse};

/// A registered (method, path) pair
struct MemoryRoute {
    method: Method,
    pattern: String,
    regex: Regex,
    param_names: Vec<String>,
    chain: HandlerChain,
}

/// Turns a chain failure into the response sent to the client
pub type ErrorHandler = Arc<dyn Fn(&RequestFailure) -> HttpResponse + Send + Sync>;

/// In-process host router
///
/// Paths are compiled into anchored regexes at registration; requests are
/// matched in registration order, the first match wins. Used by the test
/// suite and the CLI to drive registered chains without a network listener.
#[derive(Default)]
pub struct MemoryRouter {
    routes: Vec<MemoryRoute>,
    error_handler: Option<ErrorHandler>,
}

impl MemoryRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default JSON 500 for chain failures
    #[must_use]
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestFailure) -> HttpResponse + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Number of registered chains
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered `(method, path)` pairs in registration order
    #[must_use]
    pub fn registered(&self) -> Vec<(Method, String)> {
        self.routes
            .iter()
            .map(|r| (r.method.clone(), r.pattern.clone()))
            .collect()
    }

    /// Print the routing table to stdout
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for route in &self.routes {
            println!("[route] {} {}", route.method, route.pattern);
        }
    }

    fn add(&mut self, method: Method, path: &str, chain: HandlerChain) {
        let (regex, param_names) = match Self::path_to_regex(path) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(method = %method, path = %path, error = %e, "Path pattern rejected");
                return;
            }
        };
        debug!(method = %method, path = %path, params = ?param_names, "Host route added");
        self.routes.push(MemoryRoute {
            method,
            pattern: path.to_string(),
            regex,
            param_names,
            chain,
        });
    }

    /// Find the chain for a request and the path parameters it captures
    fn match_route(&self, method: &Method, path: &str) -> Option<(&MemoryRoute, HashMap<String, String>)> {
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|r| {
                let caps = r.regex.captures(path)?;
                let params = r
                    .param_names
                    .iter()
                    .zip(caps.iter().skip(1))
                    .filter_map(|(name, m)| m.map(|m| (name.clone(), decode_segment(m.as_str()))))
                    .collect();
                Some((r, params))
            })
    }

    /// Run the chain registered for `req`
    ///
    /// `None` when no route matches. Captured path parameters are added to
    /// the request percent-decoded; parameters the caller already set are kept.
    pub async fn dispatch(&self, mut req: HttpRequest) -> Option<Result<HttpResponse, RequestFailure>> {
        let (route, params) = self.match_route(&req.method, &req.path)?;
        for (name, value) in params {
            req.path_params.entry(name).or_insert(value);
        }
        Some(route.chain.call(req).await)
    }

    /// Serve one request
    ///
    /// Unmatched requests get a JSON 404. A [`RequestFailure`] from the chain
    /// goes to the error handler when one is set, otherwise it becomes a JSON
    /// 500 carrying the error text.
    pub async fn handle(&self, req: HttpRequest) -> HttpResponse {
        let request_id = req.request_id;
        let (method, path) = (req.method.clone(), req.path.clone());
        match self.dispatch(req).await {
            Some(Ok(res)) => res,
            Some(Err(failure)) => {
                debug!(
                    request_id = %request_id,
                    route = failure.key_path(),
                    error = %failure.error(),
                    status = failure.status(),
                    "Chain failed"
                );
                match &self.error_handler {
                    Some(handler) => handler(&failure),
                    None => HttpResponse::error(failure.status(), &failure.error().to_string()),
                }
            }
            None => {
                info!(method = %method, path = %path, "No route matched");
                HttpResponse::error(404, "Not Found")
            }
        }
    }

    /// Convert a path pattern to a regex and extract parameter names
    ///
    /// Placeholders may be written `{id}` or `:id`; each matches one segment.
    /// Literal segments are escaped.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), regex::Error> {
        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut param_names = Vec::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let name = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .or_else(|| segment.strip_prefix(':'));
            match name {
                Some(name) if !name.is_empty() => {
                    pattern.push_str("/([^/]+)");
                    param_names.push(name.to_string());
                }
                _ => {
                    pattern.push('/');
                    pattern.push_str(&regex::escape(segment));
                }
            }
        }

        if pattern.len() == 1 {
            pattern.push('/');
        }
        pattern.push('$');
        Ok((Regex::new(&pattern)?, param_names))
    }
}

/// Percent-decode one captured segment, keeping it raw when it is not UTF-8
pub(crate) fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

impl HostRouter for MemoryRouter {
    fn check_path(&self, path: &str) -> Result<(), String> {
        if !path.starts_with('/') {
            return Err("path must start with '/'".to_string());
        }
        let (_, names) = Self::path_to_regex(path).map_err(|e| e.to_string())?;
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(format!("parameter '{dup}' appears more than once"));
        }
        Ok(())
    }

    fn get(&mut self, path: &str, chain: HandlerChain) {
        self.add(Method::GET, path, chain);
    }

    fn post(&mut self, path: &str, chain: HandlerChain) {
        self.add(Method::POST, path, chain);
    }

    fn put(&mut self, path: &str, chain: HandlerChain) {
        self.add(Method::PUT, path, chain);
    }

    fn patch(&mut self, path: &str, chain: HandlerChain) {
        self.add(Method::PATCH, path, chain);
    }

    fn delete(&mut self, path: &str, chain: HandlerChain) {
        self.add(Method::DELETE, path, chain);
    }
}
