//! Prefix scan handlers.
//!
//! A scan without capacities is the sizing pass: it reports the exact size of
//! every entry it would return. A scan with capacities is the data pass and
//! returns at most one entry per listed capacity, or up to `max_keys` entries
//! under a uniform capacity. If any entry outgrew its capacity
//! since the sizing pass, the data pass answers with fresh sizes instead of
//! data, so the caller never receives a truncated entry.

use kvlink_core::{Capacities, DatabaseId, Error, Output, Response};
use tracing::debug;

use super::to_usize;
use crate::executor::Context;

/// Number of entries the data pass may return.
fn data_pass_len<T: Copy>(max_keys: u64, caps: &Capacities<T>) -> Result<usize, Error> {
    if let Capacities::Each(list) = caps {
        if list.len() as u64 > max_keys {
            return Err(Error::InvalidArgument {
                reason: format!("{} capacities for a page of {} keys", list.len(), max_keys),
            });
        }
    }
    Ok(to_usize(caps.page_len(max_keys)))
}

/// Handle ListKeys.
pub(crate) fn list_keys(
    ctx: &Context,
    db: DatabaseId,
    start_key: &[u8],
    prefix: &[u8],
    max_keys: u64,
    key_capacities: Option<&Capacities<u64>>,
) -> Response {
    let limits = &ctx.config.limits;
    limits.validate_scan(to_usize(max_keys))?;
    limits.validate_key(start_key)?;
    limits.validate_key(prefix)?;
    let db = ctx.catalog.get(db)?;

    match key_capacities {
        None => {
            let keys = db.backend().scan_keys(start_key, prefix, to_usize(max_keys))?;
            debug!(target: "kvlink::provider", db = %db.id(), matches = keys.len(), "Key sizing pass");
            Ok(Output::SizeNegotiationRequired {
                key_sizes: keys.iter().map(|k| k.len() as u64).collect(),
                val_sizes: Vec::new(),
            })
        }
        Some(caps) => {
            let len = data_pass_len(max_keys, caps)?;
            let keys = db.backend().scan_keys(start_key, prefix, len)?;
            let fits = keys
                .iter()
                .enumerate()
                .all(|(i, k)| caps.get(i).map_or(false, |cap| k.len() as u64 <= cap));
            if !fits {
                return Ok(Output::SizeNegotiationRequired {
                    key_sizes: keys.iter().map(|k| k.len() as u64).collect(),
                    val_sizes: Vec::new(),
                });
            }
            Ok(Output::Keys(keys))
        }
    }
}

/// Handle ListKeyvals.
pub(crate) fn list_keyvals(
    ctx: &Context,
    db: DatabaseId,
    start_key: &[u8],
    prefix: &[u8],
    max_keys: u64,
    capacities: Option<&Capacities<(u64, u64)>>,
) -> Response {
    let limits = &ctx.config.limits;
    limits.validate_scan(to_usize(max_keys))?;
    limits.validate_key(start_key)?;
    limits.validate_key(prefix)?;
    let db = ctx.catalog.get(db)?;

    let sizes_of = |entries: &[(Vec<u8>, Vec<u8>)]| Output::SizeNegotiationRequired {
        key_sizes: entries.iter().map(|(k, _)| k.len() as u64).collect(),
        val_sizes: entries.iter().map(|(_, v)| v.len() as u64).collect(),
    };

    match capacities {
        None => {
            let entries = db.backend().scan(start_key, prefix, to_usize(max_keys))?;
            debug!(target: "kvlink::provider", db = %db.id(), matches = entries.len(), "Key/value sizing pass");
            Ok(sizes_of(&entries))
        }
        Some(caps) => {
            let len = data_pass_len(max_keys, caps)?;
            let entries = db.backend().scan(start_key, prefix, len)?;
            let fits = entries.iter().enumerate().all(|(i, (k, v))| {
                caps.get(i).map_or(false, |(kcap, vcap)| {
                    k.len() as u64 <= kcap && v.len() as u64 <= vcap
                })
            });
            if !fits {
                return Ok(sizes_of(&entries));
            }
            Ok(Output::KeyValues(entries))
        }
    }
}
