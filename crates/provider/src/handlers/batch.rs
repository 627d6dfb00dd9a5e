//! Batched request handlers.
//!
//! A batch is validated as a whole before any backend call, and every batch
//! either succeeds for all keys or fails without effect.

use kvlink_core::{DatabaseId, Error, Key, Limits, Output, Response, Value};

use crate::executor::Context;

fn validate_keys(limits: &Limits, keys: &[Key]) -> Result<(), Error> {
    limits.validate_batch(keys.len())?;
    keys.iter().try_for_each(|k| limits.validate_key(k))
}

/// Handle PutMulti.
pub(crate) fn put_multi(ctx: &Context, db: DatabaseId, entries: &[(Key, Value)]) -> Response {
    let limits = &ctx.config.limits;
    limits.validate_batch(entries.len())?;
    for (k, v) in entries {
        limits.validate_key(k)?;
        limits.validate_value(v)?;
    }
    let db = ctx.catalog.get(db)?;
    db.write(|backend| backend.put_multi(entries))?;
    Ok(Output::Unit)
}

/// Handle GetMulti. `capacities[i]` bounds the value of `keys[i]`.
pub(crate) fn get_multi(
    ctx: &Context,
    db: DatabaseId,
    keys: &[Key],
    capacities: &[u64],
) -> Response {
    validate_keys(&ctx.config.limits, keys)?;
    if capacities.len() != keys.len() {
        return Err(Error::InvalidArgument {
            reason: format!(
                "{} capacities for {} keys",
                capacities.len(),
                keys.len()
            ),
        });
    }
    let db = ctx.catalog.get(db)?;
    let mut values = Vec::with_capacity(keys.len());
    for (index, (key, &capacity)) in keys.iter().zip(capacities).enumerate() {
        let value = db.backend().get(key)?;
        if let Some(v) = &value {
            let required = v.len() as u64;
            if required > capacity {
                return Err(Error::SizeMismatch {
                    index,
                    capacity,
                    required,
                });
            }
        }
        values.push(value);
    }
    Ok(Output::Values(values))
}

/// Handle LengthMulti.
pub(crate) fn length_multi(ctx: &Context, db: DatabaseId, keys: &[Key]) -> Response {
    validate_keys(&ctx.config.limits, keys)?;
    let db = ctx.catalog.get(db)?;
    let sizes = keys
        .iter()
        .map(|k| db.backend().length(k))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Output::Sizes(sizes))
}

/// Handle ExistsMulti.
pub(crate) fn exists_multi(ctx: &Context, db: DatabaseId, keys: &[Key]) -> Response {
    validate_keys(&ctx.config.limits, keys)?;
    let db = ctx.catalog.get(db)?;
    let flags = keys
        .iter()
        .map(|k| db.backend().length(k).map(|s| s.is_some()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Output::Bools(flags))
}

/// Handle EraseMulti.
pub(crate) fn erase_multi(ctx: &Context, db: DatabaseId, keys: &[Key]) -> Response {
    validate_keys(&ctx.config.limits, keys)?;
    let db = ctx.catalog.get(db)?;
    db.write(|backend| backend.erase_multi(keys))?;
    Ok(Output::Unit)
}
