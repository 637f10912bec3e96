//! # Schema Validator Cache Module
//!
//! Compiling a JSON Schema is far more expensive than running it. Every shape of
//! a contract is therefore compiled exactly once, while routes are registered,
//! and the compiled validators are shared by all requests.
//!
//! ## Cache Key Structure
//!
//! Keys are `{mode}:{shape}` where `shape` is the compact JSON text of the
//! declared schema. Routes that declare the same shape in the same mode (a
//! common error body, a shared pagination query) share one validator.
//!
//! ## Thread Safety
//!
//! The map sits behind `Arc<RwLock<..>>`. It is only written during
//! registration; request handling reads validators that were resolved into
//! each route's [`RouteValidators`] up front and never touches the lock.
//!
//! ## Configuration
//!
//! Sharing can be switched off with `schemaCache: false` (or
//! `CONTRACT_SCHEMA_CACHE=off`); every shape is then compiled on its own.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::error::ContractError;
use crate::spec::Route;
use crate::validator::{CompiledShape, RequestPart, ValidationMode};

/// Thread-safe cache of compiled shapes
#[derive(Clone)]
pub struct ValidatorCache {
    cache: Arc<RwLock<HashMap<String, CompiledShape>>>,
    enabled: bool,
}

impl ValidatorCache {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            enabled,
        }
    }

    fn cache_key(shape: &Value, mode: ValidationMode) -> String {
        let mode = match mode {
            ValidationMode::Tolerant => "tolerant",
            ValidationMode::Strict => "strict",
        };
        format!("{mode}:{shape}")
    }

    /// Get a cached validator or compile and cache a new one
    pub fn get_or_compile(&self, shape: &Value, mode: ValidationMode) -> Result<CompiledShape, String> {
        if !self.enabled {
            return CompiledShape::compile(shape, mode);
        }

        let key = Self::cache_key(shape, mode);
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(compiled) = cache.get(&key) {
                debug!(cache_key = %key, "Schema validator cache hit");
                return Ok(compiled.clone());
            }
        }

        let compiled = CompiledShape::compile(shape, mode)?;
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry(key).or_insert(compiled).clone();
        debug!(cache_size = cache.len(), "Schema validator compiled and cached");
        Ok(entry)
    }

    /// Number of distinct compiled validators
    #[must_use]
    pub fn size(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Compile every shape a route declares
    ///
    /// Fails with [`ContractError::InvalidSchema`] naming the first shape the
    /// schema library rejects.
    pub fn compile_route(&self, key_path: &str, route: &Route) -> Result<RouteValidators, ContractError> {
        let compile = |shape: &Value, part: &str, mode: ValidationMode| {
            self.get_or_compile(shape, mode)
                .map_err(|message| ContractError::InvalidSchema {
                    key_path: key_path.to_string(),
                    part: part.to_string(),
                    message,
                })
        };
        let optional = |shape: Option<&Value>, part: RequestPart| {
            shape
                .map(|s| compile(s, &part.to_string(), part.default_mode()))
                .transpose()
        };

        let path_params = compile(
            &route.path_params,
            &RequestPart::PathParams.to_string(),
            RequestPart::PathParams.default_mode(),
        )?;
        let headers = optional(route.headers.as_ref(), RequestPart::Headers)?;
        let query = optional(route.query.as_ref(), RequestPart::Query)?;
        let body = optional(route.body.as_ref(), RequestPart::Body)?;

        let mut responses = BTreeMap::new();
        for (status, shape) in &route.responses {
            let part = format!("response {status}");
            responses.insert(*status, compile(shape, &part, RequestPart::Response.default_mode())?);
        }

        Ok(RouteValidators {
            path_params,
            headers,
            query,
            body,
            responses,
        })
    }
}

impl Default for ValidatorCache {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Compiled validators of a single route, resolved at registration
#[derive(Debug, Clone)]
pub struct RouteValidators {
    pub path_params: CompiledShape,
    pub headers: Option<CompiledShape>,
    pub query: Option<CompiledShape>,
    pub body: Option<CompiledShape>,
    pub responses: BTreeMap<u16, CompiledShape>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_shapes_share_one_validator() {
        let cache = ValidatorCache::new(true);
        let shape = json!({"type": "object"});
        cache.get_or_compile(&shape, ValidationMode::Strict).unwrap();
        cache.get_or_compile(&shape, ValidationMode::Strict).unwrap();
        assert_eq!(cache.size(), 1);
        cache.get_or_compile(&shape, ValidationMode::Tolerant).unwrap();
        assert_eq!(cache.size(), 2);
        cache.clear();
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = ValidatorCache::new(false);
        cache.get_or_compile(&json!({"type": "string"}), ValidationMode::Strict).unwrap();
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn compile_route_reports_bad_shape() {
        let cache = ValidatorCache::default();
        let route = Route::post("/pets").response(201, json!({"type": 5}));
        let err = cache.compile_route("pets.create", &route).unwrap_err();
        match err {
            ContractError::InvalidSchema { key_path, part, .. } => {
                assert_eq!(key_path, "pets.create");
                assert_eq!(part, "response 201");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn compile_route_covers_every_declared_part() {
        let cache = ValidatorCache::default();
        let route = Route::get("/pets/{id}")
            .query(json!({"type": "object"}))
            .response(200, json!({"type": "object"}))
            .response(404, json!({"type": "object"}));
        let validators = cache.compile_route("pets.get", &route).unwrap();
        assert!(validators.query.is_some());
        assert!(validators.headers.is_none());
        assert!(validators.body.is_none());
        assert_eq!(validators.responses.len(), 2);
    }
}
