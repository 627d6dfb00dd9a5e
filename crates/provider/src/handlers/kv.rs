//! Single-key request handlers.

use kvlink_core::{DatabaseId, Error, Output, Response};

use crate::executor::Context;

/// Handle Put.
pub(crate) fn put(ctx: &Context, db: DatabaseId, key: &[u8], value: &[u8]) -> Response {
    ctx.config.limits.validate_key(key)?;
    ctx.config.limits.validate_value(value)?;
    let db = ctx.catalog.get(db)?;
    db.write(|backend| backend.put(key, value))?;
    Ok(Output::Unit)
}

/// Handle Get. The value is never truncated to fit `capacity`.
pub(crate) fn get(ctx: &Context, db: DatabaseId, key: &[u8], capacity: u64) -> Response {
    ctx.config.limits.validate_key(key)?;
    let db = ctx.catalog.get(db)?;
    let value = db.backend().get(key)?.ok_or(Error::UnknownKey)?;
    let required = value.len() as u64;
    if required > capacity {
        return Err(Error::SizeMismatch {
            index: 0,
            capacity,
            required,
        });
    }
    Ok(Output::Value(value))
}

/// Handle Length.
pub(crate) fn length(ctx: &Context, db: DatabaseId, key: &[u8]) -> Response {
    ctx.config.limits.validate_key(key)?;
    let db = ctx.catalog.get(db)?;
    let size = db.backend().length(key)?.ok_or(Error::UnknownKey)?;
    Ok(Output::Size(size))
}

/// Handle Exists.
pub(crate) fn exists(ctx: &Context, db: DatabaseId, key: &[u8]) -> Response {
    ctx.config.limits.validate_key(key)?;
    let db = ctx.catalog.get(db)?;
    Ok(Output::Bool(db.backend().length(key)?.is_some()))
}

/// Handle Erase.
pub(crate) fn erase(ctx: &Context, db: DatabaseId, key: &[u8]) -> Response {
    ctx.config.limits.validate_key(key)?;
    let db = ctx.catalog.get(db)?;
    db.write(|backend| backend.erase(key))?;
    Ok(Output::Unit)
}
