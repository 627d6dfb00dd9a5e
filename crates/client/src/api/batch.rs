//! Batched operations.
//!
//! Each batch is one round trip (two for `get_multi` when sizes are unknown).
//! A provider failure fails the whole batch with `Batch`; nothing is applied
//! partially.

use kvlink_core::{DatabaseId, Key, Output, Request, Value};
use tracing::debug;

use crate::convert::{from_remote_batch, unexpected};
use crate::{Error, ProviderHandle, Result};

impl ProviderHandle {
    fn call_batch(&self, request: &Request) -> Result<Output> {
        self.call(request)?.map_err(from_remote_batch)
    }

    /// Store several pairs atomically.
    pub fn put_multi(&self, db: DatabaseId, entries: Vec<(Key, Value)>) -> Result<()> {
        match self.call_batch(&Request::PutMulti { db, entries })? {
            Output::Unit => Ok(()),
            other => Err(unexpected("PutMulti", &other)),
        }
    }

    /// Value sizes, one per key in input order; `None` for absent keys.
    pub fn length_multi(&self, db: DatabaseId, keys: &[Key]) -> Result<Vec<Option<u64>>> {
        let request = Request::LengthMulti {
            db,
            keys: keys.to_vec(),
        };
        match self.call_batch(&request)? {
            Output::Sizes(sizes) if sizes.len() == keys.len() => Ok(sizes),
            other => Err(unexpected("LengthMulti", &other)),
        }
    }

    /// Presence flags, one per key in input order.
    pub fn exists_multi(&self, db: DatabaseId, keys: &[Key]) -> Result<Vec<bool>> {
        let request = Request::ExistsMulti {
            db,
            keys: keys.to_vec(),
        };
        match self.call_batch(&request)? {
            Output::Bools(flags) if flags.len() == keys.len() => Ok(flags),
            other => Err(unexpected("ExistsMulti", &other)),
        }
    }

    /// Remove several keys. Absent keys are ignored.
    pub fn erase_multi(&self, db: DatabaseId, keys: &[Key]) -> Result<()> {
        let request = Request::EraseMulti {
            db,
            keys: keys.to_vec(),
        };
        match self.call_batch(&request)? {
            Output::Unit => Ok(()),
            other => Err(unexpected("EraseMulti", &other)),
        }
    }

    /// Fetch several values, one per key in input order.
    ///
    /// One shared sizing round trip learns every size; the data pass then
    /// asks only for the keys found present.
    pub fn get_multi(&self, db: DatabaseId, keys: &[Key]) -> Result<Vec<Option<Value>>> {
        let sizes = self.length_multi(db, keys)?;
        let present: Vec<(usize, u64)> = sizes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|n| (i, n)))
            .collect();
        let mut values = vec![None; keys.len()];
        if present.is_empty() {
            return Ok(values);
        }
        debug!(
            target: "kvlink::client",
            %db,
            requested = keys.len(),
            present = present.len(),
            "Fetching batch"
        );

        let request = Request::GetMulti {
            db,
            keys: present.iter().map(|(i, _)| keys[*i].clone()).collect(),
            capacities: present.iter().map(|(_, n)| *n).collect(),
        };
        let fetched = match self.call(&request)? {
            Ok(Output::Values(v)) if v.len() == present.len() => v,
            Ok(other) => return Err(unexpected("GetMulti", &other)),
            Err(e) => {
                return Err(match from_remote_batch(e) {
                    // Report the caller's index, not the sub-batch index.
                    Error::SizeChanged {
                        index,
                        capacity,
                        required,
                    } => Error::SizeChanged {
                        index: present.get(index).map_or(index, |(i, _)| *i),
                        capacity,
                        required,
                    },
                    other => other,
                })
            }
        };
        for ((i, _), value) in present.iter().zip(fetched) {
            values[*i] = value;
        }
        Ok(values)
    }

    /// Fetch several values with a caller-asserted capacity of `hint` bytes
    /// each, skipping the sizing pass. A `hint` of zero behaves like
    /// [`ProviderHandle::get_multi`].
    pub fn get_multi_with_hint(
        &self,
        db: DatabaseId,
        keys: &[Key],
        hint: u64,
    ) -> Result<Vec<Option<Value>>> {
        if hint == 0 {
            return self.get_multi(db, keys);
        }
        let request = Request::GetMulti {
            db,
            keys: keys.to_vec(),
            capacities: vec![hint; keys.len()],
        };
        match self.call_batch(&request)? {
            Output::Values(v) if v.len() == keys.len() => Ok(v),
            other => Err(unexpected("GetMulti", &other)),
        }
    }
}
