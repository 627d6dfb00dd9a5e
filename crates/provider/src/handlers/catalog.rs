//! Catalog request handlers.

use kvlink_core::{DatabaseId, Output, Response};

use super::to_usize;
use crate::executor::Context;

/// Handle Open. An unknown name is not an error.
pub(crate) fn open(ctx: &Context, name: &str) -> Response {
    let id = ctx.catalog.find(name).unwrap_or(DatabaseId::INVALID);
    Ok(Output::DatabaseId(id))
}

/// Handle CountDatabases.
pub(crate) fn count_databases(ctx: &Context) -> Response {
    Ok(Output::Count(ctx.catalog.len() as u64))
}

/// Handle ListDatabases.
pub(crate) fn list_databases(ctx: &Context, max: u64) -> Response {
    Ok(Output::Databases(ctx.catalog.list(to_usize(max))))
}
