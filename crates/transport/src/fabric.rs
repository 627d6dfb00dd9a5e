//! Process-local network connecting instances by address.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use kvlink_core::Address;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::instance::Instance;

/// Directory of bound instances.
///
/// The fabric only holds weak references: an instance stays reachable while
/// its owner keeps it alive and has not finalized it.
#[derive(Default)]
pub struct Fabric {
    instances: DashMap<Address, Weak<Instance>>,
}

impl Fabric {
    /// Create an empty fabric.
    pub fn new() -> Arc<Self> {
        Arc::new(Fabric::default())
    }

    pub(crate) fn bind(&self, address: &Address, instance: &Arc<Instance>) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.instances.entry(address.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().upgrade().is_some() {
                    return Err(TransportError::AddressInUse {
                        address: address.clone(),
                    });
                }
                slot.insert(Arc::downgrade(instance));
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::downgrade(instance));
            }
        }
        debug!(target: "kvlink::transport", %address, "Instance bound");
        Ok(())
    }

    /// Remove `address` only if it still points at `instance`.
    pub(crate) fn unbind(&self, address: &Address, instance: *const Instance) {
        self.instances
            .remove_if(address, |_, weak| std::ptr::eq(weak.as_ptr(), instance));
    }

    /// Resolve an address to a live instance.
    pub(crate) fn resolve(&self, address: &Address) -> Result<Arc<Instance>> {
        let weak = self
            .instances
            .get(address)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TransportError::NoSuchAddress {
                address: address.clone(),
            })?;
        weak.upgrade().ok_or_else(|| TransportError::NoSuchAddress {
            address: address.clone(),
        })
    }

    /// Whether a live instance is bound at `address`.
    pub fn contains(&self, address: &Address) -> bool {
        self.resolve(address).is_ok()
    }

    /// Whether a live instance at `address` has at least one provider
    /// registered.
    pub fn hosts_providers(&self, address: &Address) -> bool {
        self.resolve(address)
            .map_or(false, |instance| !instance.provider_ids().is_empty())
    }

    /// Addresses of all live instances, sorted.
    pub fn addresses(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self
            .instances
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .map(|entry| entry.key().clone())
            .collect();
        out.sort();
        out
    }
}
