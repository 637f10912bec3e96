//! # Runtime Configuration Module
//!
//! Engine-wide switches applied when a contract is registered.
//!
//! ## Sources
//!
//! [`EngineOptions`] can be built three ways:
//!
//! - in code, starting from `EngineOptions::default()` and the builder methods
//! - from environment variables with [`EngineOptions::from_env()`]
//! - from a YAML file with [`EngineOptions::from_yaml_file()`]
//!
//! Middleware and the validation error handler are code-only.
//!
//! ## Environment Variables
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `CONTRACT_LOG_INIT` | `true`/`false` | `false` |
//! | `CONTRACT_JSON_QUERY` | `true`/`false` | `false` |
//! | `CONTRACT_RESPONSE_VALIDATION` | `true`/`false` | `false` |
//! | `CONTRACT_MISSING_RESPONSE` | `fail_closed`/`pass_through` | `fail_closed` |
//! | `CONTRACT_SCHEMA_CACHE` | `true`/`false` | `true` |
//!
//! Booleans also accept `1`/`0`, `yes`/`no` and `on`/`off`. Unparseable
//! values keep the default and log a warning.
//!
//! ## YAML
//!
//! ```yaml
//! logInitialization: true
//! jsonQuery: true
//! responseValidation: true
//! missingResponseShape: pass_through
//! schemaCache: true
//! ```

use std::env;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

use crate::middleware::Middleware;
use crate::server::{HttpRequest, HttpResponse};
use crate::validator::ValidationFailure;

/// What happens when response validation is on and the handler returns a
/// status the contract declares no shape for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingResponseShape {
    /// Forward [`crate::error::RequestError::ResponseShapeMissing`] to the host
    #[default]
    FailClosed,
    /// Send the body unvalidated
    PassThrough,
}

impl std::str::FromStr for MissingResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_closed" => Ok(Self::FailClosed),
            "pass_through" => Ok(Self::PassThrough),
            other => Err(format!("unknown missing response policy '{other}'")),
        }
    }
}

/// Builds the response sent when request validation fails
pub type ValidationErrorHandler =
    Arc<dyn Fn(&HttpRequest, &ValidationFailure) -> HttpResponse + Send + Sync>;

/// Engine options
#[derive(Clone)]
pub struct EngineOptions {
    /// One `info!` line per registered route
    pub log_initialization: bool,
    /// JSON-decode query values before validation
    pub json_query: bool,
    /// Validate handler bodies against the declared response shapes
    pub response_validation: bool,
    /// Policy for statuses without a declared response shape
    pub missing_response_shape: MissingResponseShape,
    /// Share compiled validators between identical shapes
    pub schema_cache: bool,
    /// Middleware placed before route-level middleware on every route
    pub global_middleware: Vec<Arc<dyn Middleware>>,
    /// Replaces the default 400 response for request validation failures
    pub validation_error_handler: Option<ValidationErrorHandler>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            log_initialization: false,
            json_query: false,
            response_validation: false,
            missing_response_shape: MissingResponseShape::FailClosed,
            schema_cache: true,
            global_middleware: Vec::new(),
            validation_error_handler: None,
        }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("log_initialization", &self.log_initialization)
            .field("json_query", &self.json_query)
            .field("response_validation", &self.response_validation)
            .field("missing_response_shape", &self.missing_response_shape)
            .field("schema_cache", &self.schema_cache)
            .field("global_middleware", &self.global_middleware.len())
            .field(
                "validation_error_handler",
                &self.validation_error_handler.is_some(),
            )
            .finish()
    }
}

/// On-disk form of the serialisable options
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OptionsFile {
    log_initialization: Option<bool>,
    json_query: Option<bool>,
    response_validation: Option<bool>,
    missing_response_shape: Option<MissingResponseShape>,
    schema_cache: Option<bool>,
}

fn parse_bool(name: &str, raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(variable = name, value = raw, "Ignoring unparseable boolean");
            default
        }
    }
}

impl EngineOptions {
    /// Load options from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load options through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        let flag = |name: &str, default: bool| match lookup(name) {
            Some(raw) => parse_bool(name, &raw, default),
            None => default,
        };
        options.log_initialization = flag("CONTRACT_LOG_INIT", options.log_initialization);
        options.json_query = flag("CONTRACT_JSON_QUERY", options.json_query);
        options.response_validation =
            flag("CONTRACT_RESPONSE_VALIDATION", options.response_validation);
        options.schema_cache = flag("CONTRACT_SCHEMA_CACHE", options.schema_cache);
        if let Some(raw) = lookup("CONTRACT_MISSING_RESPONSE") {
            match raw.parse() {
                Ok(policy) => options.missing_response_shape = policy,
                Err(e) => warn!(variable = "CONTRACT_MISSING_RESPONSE", error = %e, "Ignoring value"),
            }
        }
        options
    }

    /// Parse options from YAML text; absent keys keep their defaults
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let file: OptionsFile = if text.trim().is_empty() {
            OptionsFile::default()
        } else {
            serde_yaml::from_str(text).context("invalid engine options")?
        };
        let defaults = Self::default();
        Ok(Self {
            log_initialization: file.log_initialization.unwrap_or(defaults.log_initialization),
            json_query: file.json_query.unwrap_or(defaults.json_query),
            response_validation: file
                .response_validation
                .unwrap_or(defaults.response_validation),
            missing_response_shape: file
                .missing_response_shape
                .unwrap_or(defaults.missing_response_shape),
            schema_cache: file.schema_cache.unwrap_or(defaults.schema_cache),
            ..defaults
        })
    }

    /// Read options from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    #[must_use]
    pub fn log_initialization(mut self, on: bool) -> Self {
        self.log_initialization = on;
        self
    }

    #[must_use]
    pub fn json_query(mut self, on: bool) -> Self {
        self.json_query = on;
        self
    }

    #[must_use]
    pub fn response_validation(mut self, on: bool) -> Self {
        self.response_validation = on;
        self
    }

    #[must_use]
    pub fn missing_response_shape(mut self, policy: MissingResponseShape) -> Self {
        self.missing_response_shape = policy;
        self
    }

    #[must_use]
    pub fn schema_cache(mut self, on: bool) -> Self {
        self.schema_cache = on;
        self
    }

    /// Append a global middleware
    #[must_use]
    pub fn middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.global_middleware.push(mw);
        self
    }

    #[must_use]
    pub fn validation_error_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&HttpRequest, &ValidationFailure) -> HttpResponse + Send + Sync + 'static,
    {
        self.validation_error_handler = Some(Arc::new(f));
        self
    }
}
