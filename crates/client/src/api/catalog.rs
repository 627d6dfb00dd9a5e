//! Database catalog operations.

use kvlink_core::{DatabaseId, Output, Request};
use tracing::debug;

use crate::convert::unexpected;
use crate::database::Database;
use crate::{ProviderHandle, Result};

impl ProviderHandle {
    /// Resolve a database by name.
    ///
    /// Returns `DatabaseId::INVALID` when the provider hosts no database of
    /// that name.
    pub fn open(&self, name: &str) -> Result<DatabaseId> {
        match self.call_ok(&Request::Open { name: name.into() })? {
            Output::DatabaseId(id) => Ok(id),
            other => Err(unexpected("Open", &other)),
        }
    }

    /// Every hosted database as `(name, id)`, in creation order.
    ///
    /// Asks for the count first, then for at most that many entries. The
    /// second answer is the result, even if the catalog changed in between.
    pub fn list_databases(&self) -> Result<Vec<(String, DatabaseId)>> {
        let count = match self.call_ok(&Request::CountDatabases)? {
            Output::Count(n) => n,
            other => return Err(unexpected("CountDatabases", &other)),
        };
        debug!(target: "kvlink::client", provider = %self.provider_id(), count, "Listing databases");
        if count == 0 {
            return Ok(Vec::new());
        }
        match self.call_ok(&Request::ListDatabases { max: count })? {
            Output::Databases(list) => Ok(list),
            other => Err(unexpected("ListDatabases", &other)),
        }
    }

    /// Open a database by name and bind it to this handle.
    ///
    /// The returned [`Database`] holds its own reference on the handle and
    /// releases it when dropped. `None` when no database has that name.
    pub fn database(&self, name: &str) -> Result<Option<Database>> {
        let id = self.open(name)?;
        if !id.is_valid() {
            return Ok(None);
        }
        self.ref_incr()?;
        Ok(Some(Database::new(self.clone(), id, name.to_string())))
    }
}
