//! Database wrapper: a provider handle bound to one database id.

use kvlink_core::{Address, DatabaseId, Key, ProviderId, Value};
use tracing::warn;

use crate::api::{KeyPages, KeyValuePages, ScanCursor};
use crate::{ProviderHandle, Result};

/// One remote database.
///
/// Holds its own reference on the provider handle, released when the
/// wrapper is dropped.
///
/// ```ignore
/// if let Some(users) = handle.database("users")? {
///     users.put(b"alice", b"42")?;
///     assert_eq!(users.get(b"alice")?, Some(b"42".to_vec()));
/// }
/// ```
pub struct Database {
    handle: ProviderHandle,
    id: DatabaseId,
    name: String,
}

impl Database {
    pub(crate) fn new(handle: ProviderHandle, id: DatabaseId, name: String) -> Self {
        Database { handle, id, name }
    }

    /// Provider-scoped id.
    pub fn id(&self) -> DatabaseId {
        self.id
    }

    /// Name the database was opened by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle this database is reached through.
    pub fn handle(&self) -> &ProviderHandle {
        &self.handle
    }

    /// See [`ProviderHandle::put`].
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.handle.put(self.id, key, value)
    }

    /// See [`ProviderHandle::get`].
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        self.handle.get(self.id, key)
    }

    /// See [`ProviderHandle::get_with_hint`].
    pub fn get_with_hint(&self, key: &[u8], hint: u64) -> Result<Option<Value>> {
        self.handle.get_with_hint(self.id, key, hint)
    }

    /// See [`ProviderHandle::length`].
    pub fn length(&self, key: &[u8]) -> Result<Option<u64>> {
        self.handle.length(self.id, key)
    }

    /// See [`ProviderHandle::exists`].
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.handle.exists(self.id, key)
    }

    /// See [`ProviderHandle::erase`].
    pub fn erase(&self, key: &[u8]) -> Result<()> {
        self.handle.erase(self.id, key)
    }

    /// See [`ProviderHandle::put_multi`].
    pub fn put_multi(&self, entries: Vec<(Key, Value)>) -> Result<()> {
        self.handle.put_multi(self.id, entries)
    }

    /// See [`ProviderHandle::get_multi`].
    pub fn get_multi(&self, keys: &[Key]) -> Result<Vec<Option<Value>>> {
        self.handle.get_multi(self.id, keys)
    }

    /// See [`ProviderHandle::length_multi`].
    pub fn length_multi(&self, keys: &[Key]) -> Result<Vec<Option<u64>>> {
        self.handle.length_multi(self.id, keys)
    }

    /// See [`ProviderHandle::exists_multi`].
    pub fn exists_multi(&self, keys: &[Key]) -> Result<Vec<bool>> {
        self.handle.exists_multi(self.id, keys)
    }

    /// See [`ProviderHandle::erase_multi`].
    pub fn erase_multi(&self, keys: &[Key]) -> Result<()> {
        self.handle.erase_multi(self.id, keys)
    }

    /// See [`ProviderHandle::list_keys`].
    pub fn list_keys(&self, cursor: &ScanCursor) -> Result<Vec<Key>> {
        self.handle.list_keys(self.id, cursor)
    }

    /// See [`ProviderHandle::list_keyvals`].
    pub fn list_keyvals(&self, cursor: &ScanCursor) -> Result<Vec<(Key, Value)>> {
        self.handle.list_keyvals(self.id, cursor)
    }

    /// See [`ProviderHandle::scan_keys`].
    pub fn scan_keys(&self, prefix: &[u8], page_size: u64) -> KeyPages<'_> {
        self.handle.scan_keys(self.id, prefix, page_size)
    }

    /// See [`ProviderHandle::scan_keyvals`].
    pub fn scan_keyvals(&self, prefix: &[u8], page_size: u64) -> KeyValuePages<'_> {
        self.handle.scan_keyvals(self.id, prefix, page_size)
    }

    /// Move this database elsewhere, consuming the wrapper. Returns the id
    /// assigned by the destination.
    pub fn migrate(
        self,
        dest_address: &Address,
        dest_provider: ProviderId,
        dest_root: &str,
        remove_origin: bool,
    ) -> Result<DatabaseId> {
        self.handle
            .migrate_database(self.id, dest_address, dest_provider, dest_root, remove_origin)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release() {
            warn!(target: "kvlink::client", db = %self.id, error = %e, "Database wrapper release failed");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("handle", &self.handle)
            .finish()
    }
}
