use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::context::{ContextBinder, RequestContext};
use crate::error::{RequestError, RequestFailure};
use crate::handlers::{RouteHandler, RouteInput, RouteOutput};
use crate::middleware::Middleware;
use crate::runtime_config::{EngineOptions, MissingResponseShape, ValidationErrorHandler};
use crate::server::{HttpRequest, HttpResponse};
use crate::spec::Route;
use crate::validator::{coerce_string_map, query_object, RequestPart, ValidationFailure};
use crate::validator_cache::RouteValidators;

/// Validates one route's requests and runs its handler
///
/// Built once per route at registration; shared read-only by every request.
pub struct RouteEndpoint {
    key_path: String,
    route: Arc<Route>,
    handler: RouteHandler,
    validators: RouteValidators,
    json_query: bool,
    response_validation: bool,
    missing_response_shape: MissingResponseShape,
    validation_error_handler: Option<ValidationErrorHandler>,
}

impl RouteEndpoint {
    pub fn new(
        key_path: impl Into<String>,
        route: Arc<Route>,
        handler: RouteHandler,
        validators: RouteValidators,
        options: &EngineOptions,
    ) -> Self {
        Self {
            key_path: key_path.into(),
            route,
            handler,
            validators,
            json_query: options.json_query,
            response_validation: options.response_validation,
            missing_response_shape: options.missing_response_shape,
            validation_error_handler: options.validation_error_handler.clone(),
        }
    }

    /// Dotted contract key of the route
    #[must_use]
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    /// Run the four validation steps in order, stopping at the first failure
    pub fn validate_request(&self, req: &HttpRequest) -> Result<ValidatedParts, ValidationFailure> {
        let v = &self.validators;

        let params = coerce_string_map(&req.path_params, Some(&self.route.path_params));
        let params = v.path_params.validate(RequestPart::PathParams, params)?;

        let headers = coerce_string_map(&req.headers, self.route.headers.as_ref());
        let headers = match &v.headers {
            Some(shape) => shape.validate(RequestPart::Headers, headers)?,
            None => headers,
        };

        let query = query_object(&req.query, self.route.query.as_ref(), self.json_query);
        let query = match &v.query {
            Some(shape) => shape.validate(RequestPart::Query, query)?,
            None => query,
        };

        let body = req.body.clone().unwrap_or(Value::Null);
        let body = match &v.body {
            Some(shape) => shape.validate(RequestPart::Body, body)?,
            None => body,
        };

        Ok(ValidatedParts {
            params,
            headers,
            query,
            body,
        })
    }

    fn reject(&self, req: &HttpRequest, failure: &ValidationFailure) -> Result<HttpResponse, RequestError> {
        debug!(
            request_id = %req.request_id,
            route = %self.key_path,
            part = %failure.part,
            issues = failure.issues.len(),
            "Request validation failed"
        );
        match &self.validation_error_handler {
            Some(handler) => Ok(handler(req, failure)),
            None => Ok(HttpResponse::json(400, serde_json::to_value(failure)?)),
        }
    }

    /// Validate, call the handler and shape its output into a response
    pub async fn run(&self, req: Arc<HttpRequest>) -> Result<HttpResponse, RequestError> {
        let parts = match self.validate_request(&req) {
            Ok(parts) => parts,
            Err(failure) => return self.reject(&req, &failure),
        };

        let input = RouteInput {
            params: parts.params,
            query: parts.query,
            headers: parts.headers,
            body: parts.body,
            files: req.files.clone(),
            context: req
                .context()
                .cloned()
                .unwrap_or_else(|| RequestContext::none(Arc::clone(&self.route))),
            request: Arc::clone(&req),
        };

        debug!(
            request_id = %req.request_id,
            route = %self.key_path,
            method = %self.route.method,
            path = %self.route.path,
            "Request dispatched to handler"
        );
        let output = self.handler.call(input).await.map_err(RequestError::Handler)?;
        self.shape_response(&req, output)
    }

    fn shape_response(&self, req: &HttpRequest, output: RouteOutput) -> Result<HttpResponse, RequestError> {
        let RouteOutput {
            status,
            body,
            headers,
        } = output;

        if !(100..=999).contains(&status) {
            return Err(RequestError::Handler(anyhow::anyhow!(
                "handler returned invalid status {status}"
            )));
        }

        let body = if self.response_validation {
            match self.validators.responses.get(&status) {
                Some(shape) => shape
                    .validate(RequestPart::Response, body)
                    .map_err(|failure| RequestError::ResponseValidation { status, failure })?,
                None => match self.missing_response_shape {
                    MissingResponseShape::FailClosed => {
                        return Err(RequestError::ResponseShapeMissing { status })
                    }
                    MissingResponseShape::PassThrough => {
                        debug!(
                            request_id = %req.request_id,
                            route = %self.key_path,
                            status,
                            "No response shape declared; sending body unvalidated"
                        );
                        body
                    }
                },
            }
        } else {
            body
        };

        let mut res = HttpResponse::json(status, body);
        for (name, value) in headers {
            res.set_header(&name, value);
        }
        Ok(res)
    }
}

/// Request parts after coercion and validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedParts {
    pub params: Value,
    pub headers: Value,
    pub query: Value,
    pub body: Value,
}

/// One element of a handler chain
pub enum Stage {
    /// Attaches the request context; always first
    Context(ContextBinder),
    /// Global or route-level middleware
    Middleware(Arc<dyn Middleware>),
    /// Validation plus the route implementation; always last
    Endpoint(RouteEndpoint),
}

/// The handler chain registered with the host for one route
///
/// `[context, global middleware.., route middleware.., endpoint]`
#[derive(Clone)]
pub struct HandlerChain {
    key_path: Arc<str>,
    route: Arc<Route>,
    stages: Arc<[Stage]>,
}

impl HandlerChain {
    pub fn new(key_path: impl Into<Arc<str>>, route: Arc<Route>, stages: Vec<Stage>) -> Self {
        Self {
            key_path: key_path.into(),
            route,
            stages: stages.into(),
        }
    }

    /// Dotted contract key of the route this chain serves
    #[must_use]
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Number of stages including the context binder and the endpoint
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run the chain for one request
    ///
    /// A middleware `before` that returns a response ends the chain there.
    /// Every middleware that was entered then sees the outcome in reverse
    /// order: `after` for a response, `on_error` for a failure. Failures reach
    /// the host as a [`RequestFailure`] naming this chain's route.
    pub async fn call(&self, mut req: HttpRequest) -> Result<HttpResponse, RequestFailure> {
        let mut entered: Vec<(&Arc<dyn Middleware>, Instant)> = Vec::new();
        let mut stages = self.stages.iter();

        let (req, outcome) = loop {
            let Some(stage) = stages.next() else {
                let error = RequestError::Handler(anyhow::anyhow!("handler chain has no endpoint"));
                break (Arc::new(req), Err(error));
            };
            match stage {
                Stage::Context(binder) => {
                    if let Err(error) = binder.bind(&mut req).await {
                        break (Arc::new(req), Err(error));
                    }
                }
                Stage::Middleware(mw) => {
                    let start = Instant::now();
                    if let Some(early) = mw.before(&req) {
                        debug!(
                            request_id = %req.request_id,
                            route = %self.key_path,
                            middleware = mw.name(),
                            status = early.status,
                            "Middleware returned early response"
                        );
                        break (Arc::new(req), Ok(early));
                    }
                    entered.push((mw, start));
                }
                Stage::Endpoint(endpoint) => {
                    let req = Arc::new(req);
                    let outcome = endpoint.run(Arc::clone(&req)).await;
                    break (req, outcome);
                }
            }
        };

        match outcome {
            Ok(mut res) => {
                for (mw, start) in entered.into_iter().rev() {
                    let latency: Duration = start.elapsed();
                    mw.after(&req, &mut res, latency);
                }
                Ok(res)
            }
            Err(error) => {
                for (mw, start) in entered.into_iter().rev() {
                    mw.on_error(&req, &error, start.elapsed());
                }
                let context = req
                    .context()
                    .cloned()
                    .unwrap_or_else(|| RequestContext::none(Arc::clone(&self.route)));
                Err(RequestFailure::new(Arc::clone(&self.key_path), context, error))
            }
        }
    }
}
