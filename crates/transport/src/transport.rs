//! Transport abstraction consumed by clients and providers.
//!
//! Defines the two seams of the fabric:
//! - [`Transport`]: what a caller needs to reach a provider
//! - [`RequestHandler`]: what a provider implements to be reachable
//!
//! Calls are synchronous: `call` returns once the provider has answered or the
//! transport has failed. Timeouts and retries are the transport's concern.

use kvlink_core::{Address, ProviderId, Request, Response};

use crate::error::Result;

/// Outbound side of the fabric.
///
/// A transport is bound to one local address. The address and selector passed
/// to `call` are resolved by the transport; callers treat them as opaque.
pub trait Transport: Send + Sync {
    /// Address this transport is bound to.
    fn address(&self) -> &Address;

    /// Whether calls can currently be issued.
    fn is_ready(&self) -> bool;

    /// Resolve a peer name (`local://name` or bare `name`) to an address.
    ///
    /// Errors:
    /// - `NoSuchAddress`: nothing is bound under that name
    fn lookup(&self, name: &str) -> Result<Address>;

    /// Send one request to `provider` at `target` and wait for its answer.
    ///
    /// A provider-level failure comes back as `Ok(Err(_))`; `Err(_)` means the
    /// request never reached a provider or the answer never came back.
    ///
    /// Errors:
    /// - `NoSuchAddress` / `NoProvider`: nothing answers there
    /// - `Finalized`: this transport or the target shut down
    /// - `Codec`: a frame could not be encoded or decoded
    fn call(&self, target: &Address, provider: ProviderId, request: &Request) -> Result<Response>;

    /// Ask the instance at `target` to shut down.
    ///
    /// Errors:
    /// - `ShutdownRefused`: the target did not enable remote shutdown
    fn shutdown_remote(&self, target: &Address) -> Result<()>;
}

/// Inbound side of the fabric, implemented by providers.
pub trait RequestHandler: Send + Sync {
    /// Answer one request sent from `origin`.
    fn handle(&self, origin: &Address, request: Request) -> Response;
}
