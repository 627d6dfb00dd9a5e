//! Transport instance: one endpoint on the fabric.
//!
//! An instance is both sides of the transport. Providers register on it under
//! an 8-bit selector and receive decoded requests; clients and providers use it
//! to send requests to other instances. Every call crosses an encode/decode
//! boundary so that nothing but the frame reaches the peer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kvlink_core::{codec, Address, ProviderId, Request, Response};
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::fabric::Fabric;
use crate::transport::{RequestHandler, Transport};

/// An endpoint bound to an address on a [`Fabric`].
///
/// # Example
///
/// ```ignore
/// let fabric = Fabric::new();
/// let server = Instance::bind(&fabric, "server")?;
/// server.enable_remote_shutdown();
/// // ... register providers ...
/// server.wait_for_finalize();
/// ```
pub struct Instance {
    address: Address,
    fabric: Arc<Fabric>,
    handlers: RwLock<BTreeMap<ProviderId, Arc<dyn RequestHandler>>>,
    remote_shutdown: AtomicBool,
    finalized: Mutex<bool>,
    finalized_cv: Condvar,
}

impl Instance {
    /// Bind an instance under `local://<name>`.
    ///
    /// Errors:
    /// - `AddressInUse`: a live instance already has that name
    pub fn bind(fabric: &Arc<Fabric>, name: &str) -> Result<Arc<Self>> {
        let address = Address::local(name.trim_start_matches(Address::LOCAL_SCHEME));
        let instance = Arc::new(Instance {
            address: address.clone(),
            fabric: Arc::clone(fabric),
            handlers: RwLock::new(BTreeMap::new()),
            remote_shutdown: AtomicBool::new(false),
            finalized: Mutex::new(false),
            finalized_cv: Condvar::new(),
        });
        fabric.bind(&address, &instance)?;
        info!(target: "kvlink::transport", %address, "Instance started");
        Ok(instance)
    }

    /// Bind an instance under a fresh random name.
    pub fn new(fabric: &Arc<Fabric>) -> Result<Arc<Self>> {
        Self::bind(fabric, &uuid::Uuid::new_v4().to_string())
    }

    /// The fabric this instance is bound to.
    pub fn fabric(&self) -> &Arc<Fabric> {
        &self.fabric
    }

    /// Register a handler under `provider`.
    ///
    /// Errors:
    /// - `ProviderInUse`: the selector is taken
    /// - `Finalized`: the instance no longer accepts registrations
    pub fn register_provider(
        &self,
        provider: ProviderId,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<()> {
        if self.is_finalized() {
            return Err(TransportError::Finalized {
                address: self.address.clone(),
            });
        }
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&provider) {
            return Err(TransportError::ProviderInUse {
                address: self.address.clone(),
                provider,
            });
        }
        handlers.insert(provider, handler);
        debug!(target: "kvlink::transport", address = %self.address, %provider, "Provider registered");
        Ok(())
    }

    /// Remove the handler registered under `provider`, returning it.
    pub fn deregister_provider(&self, provider: ProviderId) -> Option<Arc<dyn RequestHandler>> {
        self.handlers.write().remove(&provider)
    }

    /// Selectors currently registered, ascending.
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.handlers.read().keys().copied().collect()
    }

    /// Allow peers to shut this instance down with `shutdown_remote`.
    pub fn enable_remote_shutdown(&self) {
        self.remote_shutdown.store(true, Ordering::SeqCst);
    }

    /// Stop the instance: drop every provider, unbind the address and wake
    /// `wait_for_finalize` callers. Calling it again has no effect.
    pub fn finalize(&self) {
        {
            let mut done = self.finalized.lock();
            if *done {
                return;
            }
            *done = true;
        }
        // Handlers are dropped outside the lock so their destructors can flush.
        let handlers = std::mem::take(&mut *self.handlers.write());
        self.fabric.unbind(&self.address, self as *const Instance);
        info!(
            target: "kvlink::transport",
            address = %self.address,
            providers = handlers.len(),
            "Instance finalized"
        );
        drop(handlers);
        self.finalized_cv.notify_all();
    }

    /// Whether `finalize` has run.
    pub fn is_finalized(&self) -> bool {
        *self.finalized.lock()
    }

    /// Block until the instance is finalized, locally or remotely.
    pub fn wait_for_finalize(&self) {
        let mut done = self.finalized.lock();
        while !*done {
            self.finalized_cv.wait(&mut done);
        }
    }

    /// Decode a frame, run the handler and encode its answer.
    fn dispatch(&self, origin: &Address, provider: ProviderId, frame: &[u8]) -> Result<Vec<u8>> {
        if self.is_finalized() {
            return Err(TransportError::Finalized {
                address: self.address.clone(),
            });
        }
        // The handler runs without the table lock held; it may call back into
        // this instance (migration between co-located providers).
        let handler = self
            .handlers
            .read()
            .get(&provider)
            .cloned()
            .ok_or_else(|| TransportError::NoProvider {
                address: self.address.clone(),
                provider,
            })?;
        let request = codec::decode_request(frame)?;
        let response = handler.handle(origin, request);
        Ok(codec::encode_response(&response)?)
    }

    fn accept_shutdown(&self, origin: &Address) -> Result<()> {
        if !self.remote_shutdown.load(Ordering::SeqCst) {
            warn!(
                target: "kvlink::transport",
                address = %self.address,
                %origin,
                "Remote shutdown refused"
            );
            return Err(TransportError::ShutdownRefused {
                address: self.address.clone(),
            });
        }
        info!(target: "kvlink::transport", address = %self.address, %origin, "Remote shutdown requested");
        self.finalize();
        Ok(())
    }
}

impl Transport for Instance {
    fn address(&self) -> &Address {
        &self.address
    }

    fn is_ready(&self) -> bool {
        !self.is_finalized()
    }

    fn lookup(&self, name: &str) -> Result<Address> {
        let address = if name.starts_with(Address::LOCAL_SCHEME) {
            Address::new(name)
        } else {
            Address::local(name)
        };
        if self.fabric.contains(&address) {
            Ok(address)
        } else {
            Err(TransportError::NoSuchAddress { address })
        }
    }

    fn call(&self, target: &Address, provider: ProviderId, request: &Request) -> Result<Response> {
        if self.is_finalized() {
            return Err(TransportError::Finalized {
                address: self.address.clone(),
            });
        }
        debug!(
            target: "kvlink::transport",
            %target,
            %provider,
            request = request.name(),
            "Call"
        );
        let frame = codec::encode_request(request)?;
        let peer = self.fabric.resolve(target)?;
        let reply = peer.dispatch(&self.address, provider, &frame)?;
        Ok(codec::decode_response(&reply)?)
    }

    fn shutdown_remote(&self, target: &Address) -> Result<()> {
        let peer = self.fabric.resolve(target)?;
        peer.accept_shutdown(&self.address)
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.fabric.unbind(&self.address, self as *const Instance);
    }
}
