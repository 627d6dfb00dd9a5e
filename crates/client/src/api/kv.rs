//! Single-key operations.

use kvlink_core::{DatabaseId, Error as RemoteError, Output, Request, Value};
use tracing::debug;

use crate::convert::{from_remote, unexpected};
use crate::{ProviderHandle, Result};

impl ProviderHandle {
    /// Size of the value stored under `key`.
    ///
    /// Returns `None` when the key is absent and `Some(0)` for an empty value.
    pub fn length(&self, db: DatabaseId, key: &[u8]) -> Result<Option<u64>> {
        let request = Request::Length {
            db,
            key: key.to_vec(),
        };
        match self.call(&request)? {
            Ok(Output::Size(n)) => Ok(Some(n)),
            Ok(other) => Err(unexpected("Length", &other)),
            Err(RemoteError::UnknownKey) => Ok(None),
            Err(e) => Err(from_remote(e)),
        }
    }

    /// Fetch the value stored under `key`.
    ///
    /// Learns the size with [`ProviderHandle::length`] first, then fetches
    /// with exactly that capacity.
    pub fn get(&self, db: DatabaseId, key: &[u8]) -> Result<Option<Value>> {
        self.get_with_hint(db, key, 0)
    }

    /// Fetch the value stored under `key` into a buffer of `hint` bytes.
    ///
    /// A `hint` of zero negotiates the size first. A value larger than the
    /// capacity fails with `SizeChanged`; a key erased between the two passes
    /// yields `None`.
    pub fn get_with_hint(&self, db: DatabaseId, key: &[u8], hint: u64) -> Result<Option<Value>> {
        let capacity = if hint == 0 {
            match self.length(db, key)? {
                Some(n) => n,
                None => return Ok(None),
            }
        } else {
            hint
        };
        debug!(target: "kvlink::client", %db, capacity, "Fetching value");

        let request = Request::Get {
            db,
            key: key.to_vec(),
            capacity,
        };
        match self.call(&request)? {
            Ok(Output::Value(v)) => Ok(Some(v)),
            Ok(other) => Err(unexpected("Get", &other)),
            Err(RemoteError::UnknownKey) => Ok(None),
            Err(e) => Err(from_remote(e)),
        }
    }

    /// Whether `key` is present.
    pub fn exists(&self, db: DatabaseId, key: &[u8]) -> Result<bool> {
        let request = Request::Exists {
            db,
            key: key.to_vec(),
        };
        match self.call_ok(&request)? {
            Output::Bool(b) => Ok(b),
            other => Err(unexpected("Exists", &other)),
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn put(&self, db: DatabaseId, key: &[u8], value: &[u8]) -> Result<()> {
        let request = Request::Put {
            db,
            key: key.to_vec(),
            value: value.to_vec(),
        };
        match self.call_ok(&request)? {
            Output::Unit => Ok(()),
            other => Err(unexpected("Put", &other)),
        }
    }

    /// Remove `key`. Removing an absent key succeeds.
    pub fn erase(&self, db: DatabaseId, key: &[u8]) -> Result<()> {
        let request = Request::Erase {
            db,
            key: key.to_vec(),
        };
        match self.call_ok(&request)? {
            Output::Unit => Ok(()),
            other => Err(unexpected("Erase", &other)),
        }
    }
}
