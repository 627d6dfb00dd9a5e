//! Client session: the binding between a caller and one transport instance.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use kvlink_core::{Address, ProviderId, Request};
use kvlink_transport::{Transport, TransportError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::convert::from_remote;
use crate::handle::ProviderHandle;
use crate::{Error, Result};

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Send one probe round trip when a provider handle is created, so an
    /// unreachable provider fails at creation rather than on first use.
    #[serde(default = "default_probe_on_create")]
    pub probe_on_create: bool,
}

fn default_probe_on_create() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            probe_on_create: default_probe_on_create(),
        }
    }
}

/// Session state shared with every handle derived from it.
pub(crate) struct Session {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: ClientConfig,
    closed: AtomicBool,
    live_handles: AtomicUsize,
}

impl Session {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn handle_released(&self) {
        self.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A client context bound to one transport instance.
///
/// # Example
///
/// ```ignore
/// let client = Client::init(instance)?;
/// let handle = client.provider_handle_create(&address, ProviderId(1))?;
/// let db = handle.open("users")?;
/// handle.put(db, b"alice", b"42")?;
/// handle.release()?;
/// client.finalize();
/// ```
pub struct Client {
    session: Arc<Session>,
}

impl Client {
    /// Create a session with the default configuration.
    ///
    /// Errors:
    /// - `Init`: the transport is not ready
    pub fn init(transport: Arc<dyn Transport>) -> Result<Self> {
        Self::init_with_config(transport, ClientConfig::default())
    }

    /// Create a session.
    pub fn init_with_config(transport: Arc<dyn Transport>, config: ClientConfig) -> Result<Self> {
        if !transport.is_ready() {
            return Err(Error::Init {
                reason: format!("transport at {} is not ready", transport.address()),
            });
        }
        debug!(target: "kvlink::client", address = %transport.address(), "Client initialized");
        Ok(Client {
            session: Arc::new(Session {
                transport,
                config,
                closed: AtomicBool::new(false),
                live_handles: AtomicUsize::new(0),
            }),
        })
    }

    /// Address of the local transport instance.
    pub fn address(&self) -> &Address {
        self.session.transport.address()
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.session.config
    }

    /// Number of handles whose reference count has not reached zero.
    pub fn live_handles(&self) -> usize {
        self.session.live_handles.load(Ordering::SeqCst)
    }

    /// Resolve a peer name (or `local://` address) to an address.
    pub fn lookup(&self, name: &str) -> Result<Address> {
        self.ensure_open()?;
        Ok(self.session.transport.lookup(name)?)
    }

    /// Create a handle to the provider at `address`/`provider` with a
    /// reference count of one.
    ///
    /// Errors:
    /// - `UnreachableProvider`: nothing answers the probe
    /// - `SessionClosed`: the session was finalized
    pub fn provider_handle_create(
        &self,
        address: &Address,
        provider: ProviderId,
    ) -> Result<ProviderHandle> {
        self.ensure_open()?;
        if self.session.config.probe_on_create {
            match self.session.transport.call(address, provider, &Request::Probe) {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(from_remote(e)),
                Err(TransportError::NoSuchAddress { .. }) | Err(TransportError::NoProvider { .. }) => {
                    return Err(Error::UnreachableProvider {
                        address: address.clone(),
                        provider,
                    })
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.session.live_handles.fetch_add(1, Ordering::SeqCst);
        debug!(target: "kvlink::client", %address, %provider, "Provider handle created");
        Ok(ProviderHandle::new(
            Arc::clone(&self.session),
            address.clone(),
            provider,
        ))
    }

    /// Ask the process at `address` to terminate. Local handles are not
    /// affected; calls through them fail once the peer is gone.
    pub fn shutdown_service(&self, address: &Address) -> Result<()> {
        self.ensure_open()?;
        info!(target: "kvlink::client", %address, "Requesting remote shutdown");
        Ok(self.session.transport.shutdown_remote(address)?)
    }

    /// End the session. Handles that are still live fail with
    /// `SessionClosed` from now on.
    pub fn finalize(self) {
        let live = self.live_handles();
        if live > 0 {
            warn!(
                target: "kvlink::client",
                live_handles = live,
                "Client finalized with live provider handles"
            );
        }
        self.session.closed.store(true, Ordering::SeqCst);
        debug!(target: "kvlink::client", address = %self.address(), "Client finalized");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.session.is_closed() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("address", self.address())
            .field("live_handles", &self.live_handles())
            .finish()
    }
}
