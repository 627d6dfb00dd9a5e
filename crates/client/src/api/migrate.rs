//! Database migration.

use kvlink_core::{Address, DatabaseId, Output, ProviderId, Request};
use tracing::info;

use crate::convert::unexpected;
use crate::{ProviderHandle, Result};

impl ProviderHandle {
    /// Move database `db` to the provider at `dest_address`/`dest_provider`,
    /// placing its files under `dest_root` (empty for the destination's
    /// default root).
    ///
    /// Returns the id the destination assigned. With `remove_origin`, the
    /// source copy is removed once the destination has confirmed. On failure
    /// the source is untouched and nothing is created at the destination.
    pub fn migrate_database(
        &self,
        db: DatabaseId,
        dest_address: &Address,
        dest_provider: ProviderId,
        dest_root: &str,
        remove_origin: bool,
    ) -> Result<DatabaseId> {
        let request = Request::MigrateDatabase {
            db,
            dest_address: dest_address.clone(),
            dest_provider,
            dest_root: dest_root.to_string(),
            remove_origin,
        };
        match self.call_ok(&request)? {
            Output::DatabaseId(new_id) => {
                info!(
                    target: "kvlink::client",
                    %db,
                    %dest_address,
                    %dest_provider,
                    %new_id,
                    remove_origin,
                    "Database migrated"
                );
                Ok(new_id)
            }
            other => Err(unexpected("MigrateDatabase", &other)),
        }
    }
}
