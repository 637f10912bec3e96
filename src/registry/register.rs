use std::sync::Arc;

use http::Method;
use tracing::info;

use super::walk::{walk, BoundRoute};
use crate::context::ContextBinder;
use crate::dispatcher::{HandlerChain, RouteEndpoint, Stage};
use crate::error::ContractError;
use crate::handlers::ImplTree;
use crate::router::{register_method, HostRouter, SUPPORTED_METHODS};
use crate::runtime_config::EngineOptions;
use crate::spec::ContractRouter;
use crate::validator_cache::ValidatorCache;

/// Summary of one route handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    pub key_path: String,
    pub method: Method,
    pub path: String,
    /// Global plus route-level middleware in the chain
    pub middleware: usize,
}

/// Bind `implementation` to `contract` and register one chain per route
///
/// The whole tree is walked, every method and path checked and every shape
/// compiled before the first host call, so an `Err` means the host saw nothing.
/// Registration order is the implementation tree's key order.
pub fn register<H: HostRouter + ?Sized>(
    host: &mut H,
    contract: &ContractRouter,
    implementation: &ImplTree,
    options: &EngineOptions,
) -> Result<Vec<RegisteredRoute>, ContractError> {
    let cache = ValidatorCache::new(options.schema_cache);
    let prepared = walk(contract, implementation)?
        .into_iter()
        .map(|bound| prepare(&*host, bound, &cache, options))
        .collect::<Result<Vec<_>, _>>()?;

    let mut registered = Vec::with_capacity(prepared.len());
    for (summary, chain) in prepared {
        if !register_method(host, &summary.method, &summary.path, chain) {
            return Err(ContractError::UnsupportedMethod {
                key_path: summary.key_path,
                method: summary.method.to_string(),
            });
        }
        if options.log_initialization {
            info!(
                method = %summary.method,
                path = %summary.path,
                route = %summary.key_path,
                "[contract-router] registered route"
            );
        }
        registered.push(summary);
    }
    Ok(registered)
}

/// Build the chain `[context, global middleware.., route middleware.., endpoint]`
fn prepare<H: HostRouter + ?Sized>(
    host: &H,
    bound: BoundRoute,
    cache: &ValidatorCache,
    options: &EngineOptions,
) -> Result<(RegisteredRoute, HandlerChain), ContractError> {
    let BoundRoute {
        key_path,
        route,
        route_impl,
        context_fn,
    } = bound;

    if !SUPPORTED_METHODS.contains(&route.method) {
        return Err(ContractError::UnsupportedMethod {
            key_path,
            method: route.method.to_string(),
        });
    }
    if let Err(message) = host.check_path(&route.path) {
        return Err(ContractError::InvalidPath {
            key_path,
            path: route.path.clone(),
            message,
        });
    }
    let validators = cache.compile_route(&key_path, &route)?;

    let middleware = options
        .global_middleware
        .iter()
        .chain(route_impl.middleware.iter())
        .map(|mw| Stage::Middleware(Arc::clone(mw)));

    let mut stages = Vec::with_capacity(2 + options.global_middleware.len() + route_impl.middleware.len());
    stages.push(Stage::Context(ContextBinder::new(Arc::clone(&route), context_fn)));
    stages.extend(middleware);
    let middleware_count = stages.len() - 1;
    stages.push(Stage::Endpoint(RouteEndpoint::new(
        key_path.as_str(),
        Arc::clone(&route),
        route_impl.handler,
        validators,
        options,
    )));

    let chain = HandlerChain::new(key_path.as_str(), Arc::clone(&route), stages);
    let summary = RegisteredRoute {
        key_path,
        method: route.method.clone(),
        path: route.path.clone(),
        middleware: middleware_count,
    };
    Ok((summary, chain))
}
