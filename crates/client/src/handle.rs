//! Reference-counted provider handles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kvlink_core::{Address, Output, ProviderId, Request, Response};
use tracing::{debug, warn};

use crate::convert::from_remote;
use crate::session::Session;
use crate::{Error, Result};

struct HandleInner {
    session: Arc<Session>,
    address: Address,
    provider: ProviderId,
    refs: AtomicU64,
}

/// Reference to a remote provider at an address and selector.
///
/// The handle carries an explicit reference count, starting at one. Every
/// holder that calls [`ProviderHandle::ref_incr`] owes one
/// [`ProviderHandle::release`]; the handle is invalid once the count reaches
/// zero. Cloning shares the same count without changing it.
///
/// Operations live in the `api` modules: catalog, key/value, batch, scan and
/// migration.
#[derive(Clone)]
pub struct ProviderHandle {
    inner: Arc<HandleInner>,
}

impl ProviderHandle {
    pub(crate) fn new(session: Arc<Session>, address: Address, provider: ProviderId) -> Self {
        ProviderHandle {
            inner: Arc::new(HandleInner {
                session,
                address,
                provider,
                refs: AtomicU64::new(1),
            }),
        }
    }

    /// Address of the provider's instance.
    pub fn address(&self) -> &Address {
        &self.inner.address
    }

    /// Provider selector.
    pub fn provider_id(&self) -> ProviderId {
        self.inner.provider
    }

    /// Current reference count.
    pub fn ref_count(&self) -> u64 {
        self.inner.refs.load(Ordering::SeqCst)
    }

    /// Add one reference.
    ///
    /// Errors:
    /// - `UseAfterRelease`: the count already reached zero
    pub fn ref_incr(&self) -> Result<()> {
        self.inner
            .refs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n == 0 {
                    None
                } else {
                    Some(n + 1)
                }
            })
            .map_err(|_| Error::UseAfterRelease)?;
        Ok(())
    }

    /// Drop one reference; the handle becomes invalid when the count reaches
    /// zero.
    ///
    /// Errors:
    /// - `UseAfterRelease`: the count already reached zero
    pub fn release(&self) -> Result<()> {
        let previous = self
            .inner
            .refs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_err(|_| {
                warn!(
                    target: "kvlink::client",
                    address = %self.inner.address,
                    provider = %self.inner.provider,
                    "Release of an already released provider handle"
                );
                Error::UseAfterRelease
            })?;
        if previous == 1 {
            self.inner.session.handle_released();
            debug!(
                target: "kvlink::client",
                address = %self.inner.address,
                provider = %self.inner.provider,
                "Provider handle released"
            );
        }
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.ref_count() == 0 {
            return Err(Error::UseAfterRelease);
        }
        if self.inner.session.is_closed() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    /// Send a request and return the provider's raw answer.
    pub(crate) fn call(&self, request: &Request) -> Result<Response> {
        self.ensure_live()?;
        Ok(self
            .inner
            .session
            .transport
            .call(&self.inner.address, self.inner.provider, request)?)
    }

    /// Send a request, treating any provider error as a single-entry failure.
    pub(crate) fn call_ok(&self, request: &Request) -> Result<Output> {
        self.call(request)?.map_err(from_remote)
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("address", &self.inner.address)
            .field("provider", &self.inner.provider)
            .field("refs", &self.ref_count())
            .finish()
    }
}
