//! Database migration handlers.
//!
//! The source provider fences the database against writes, snapshots it and
//! ships it in a single `ReceiveDatabase` call. The destination creates the
//! database and loads the snapshot before it becomes visible. The source copy
//! is removed only once the destination has answered with its new id; if the
//! transfer fails, or the origin is kept, the fence is lifted again.
//!
//! `ReceiveDatabase` is only honored when the caller is itself an instance
//! hosting providers, and a persistent database is never received into a
//! file that already exists.

use kvlink_core::{
    Address, DatabaseId, DatabaseType, Error, Key, Output, ProviderId, Request, Response, Value,
};
use kvlink_transport::Transport;
use tracing::{info, warn};

use crate::database::Database;
use crate::executor::Context;

fn migration_error(reason: impl Into<String>) -> Error {
    Error::Migration {
        reason: reason.into(),
    }
}

/// Handle MigrateDatabase (source side).
pub(crate) fn migrate_database(
    ctx: &Context,
    db: DatabaseId,
    dest_address: &Address,
    dest_provider: ProviderId,
    dest_root: &str,
    remove_origin: bool,
) -> Response {
    let source = ctx.catalog.get(db)?;
    source.fence()?;

    let new_id = match transfer(ctx, &source, dest_address, dest_provider, dest_root) {
        Ok(new_id) => new_id,
        Err(e) => {
            source.unfence();
            return Err(e);
        }
    };

    if remove_origin {
        drop(source);
        if let Err(e) = ctx.catalog.destroy(db) {
            warn!(target: "kvlink::provider", %db, error = %e, "Origin removal after migration failed");
        }
    } else {
        source.unfence();
    }
    Ok(Output::DatabaseId(new_id))
}

/// Ship a fenced database to the destination and return its new id there.
fn transfer(
    ctx: &Context,
    source: &Database,
    dest_address: &Address,
    dest_provider: ProviderId,
    dest_root: &str,
) -> Result<DatabaseId, Error> {
    let instance = ctx
        .outbound
        .upgrade()
        .ok_or_else(|| migration_error("source instance is shut down"))?;

    let entries = source.backend().entries()?;
    let key_count = entries.len();
    let request = Request::ReceiveDatabase {
        name: source.name().to_string(),
        db_type: source.db_type(),
        root: dest_root.to_string(),
        entries,
    };

    let new_id = match instance.call(dest_address, dest_provider, &request) {
        Ok(Ok(Output::DatabaseId(id))) => id,
        Ok(Ok(other)) => {
            return Err(migration_error(format!(
                "destination answered {}",
                other.name()
            )))
        }
        Ok(Err(e)) => return Err(migration_error(format!("destination refused: {}", e))),
        Err(e) => return Err(migration_error(format!("transport: {}", e))),
    };

    info!(
        target: "kvlink::provider",
        db = %source.id(),
        name = source.name(),
        %dest_address,
        %dest_provider,
        %new_id,
        keys = key_count,
        "Database migrated"
    );
    Ok(new_id)
}

/// Reject a `ReceiveDatabase` that did not come from a provider host.
pub(crate) fn check_origin(ctx: &Context, origin: &Address) -> Result<(), Error> {
    let hosts_providers = ctx
        .outbound
        .upgrade()
        .map_or(false, |instance| instance.fabric().hosts_providers(origin));
    if hosts_providers {
        Ok(())
    } else {
        Err(migration_error(format!("{} hosts no provider", origin)))
    }
}

/// Handle ReceiveDatabase (destination side).
pub(crate) fn receive_database(
    ctx: &Context,
    name: &str,
    db_type: DatabaseType,
    root: &str,
    entries: &[(Key, Value)],
) -> Response {
    if !ctx.config.accept_migrations {
        return Err(migration_error("provider does not accept migrations"));
    }
    let limits = &ctx.config.limits;
    for (k, v) in entries {
        limits.validate_key(k)?;
        limits.validate_value(v)?;
    }
    let root = ctx.resolve_root(root);
    let db = ctx
        .catalog
        .create_loaded(name, db_type, &root, entries)
        .map_err(|e| match e {
            Error::DatabaseExists { .. } | Error::DatabaseCreate { .. } => {
                migration_error(e.to_string())
            }
            other => other,
        })?;
    Ok(Output::DatabaseId(db.id()))
}
