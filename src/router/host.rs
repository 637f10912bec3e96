use http::Method;

use crate::dispatcher::HandlerChain;

/// The external router a contract is registered with
///
/// Registration calls exactly one method-specific function per route with the
/// route's declared path, verbatim. Implement this for the HTTP framework that
/// owns the listener; [`super::MemoryRouter`] is the in-process version.
pub trait HostRouter {
    /// Reject a path pattern this host cannot route
    ///
    /// Called for every route before the first registration call, so a
    /// rejected path leaves the host untouched.
    fn check_path(&self, _path: &str) -> Result<(), String> {
        Ok(())
    }

    fn get(&mut self, path: &str, chain: HandlerChain);
    fn post(&mut self, path: &str, chain: HandlerChain);
    fn put(&mut self, path: &str, chain: HandlerChain);
    fn patch(&mut self, path: &str, chain: HandlerChain);
    fn delete(&mut self, path: &str, chain: HandlerChain);
}

/// Methods a contract route may declare
pub const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Hand `chain` to the registration call matching `method`
///
/// Returns `false` for a method outside [`SUPPORTED_METHODS`].
pub fn register_method<H: HostRouter + ?Sized>(
    host: &mut H,
    method: &Method,
    path: &str,
    chain: HandlerChain,
) -> bool {
    match *method {
        Method::GET => host.get(path, chain),
        Method::POST => host.post(path, chain),
        Method::PUT => host.put(path, chain),
        Method::PATCH => host.patch(path, chain),
        Method::DELETE => host.delete(path, chain),
        _ => return false,
    }
    true
}
