//! Prefix scans.
//!
//! A scan returns at most `max_keys` entries whose key starts with `prefix`
//! and sorts strictly after `start_key` (from the first match when
//! `start_key` is empty). A page with exactly `max_keys` entries may not be
//! the last; continue from its last key and stop on a short page.

use kvlink_core::{Capacities, DatabaseId, Key, Output, Request, Value};
use tracing::debug;

use crate::convert::unexpected;
use crate::{Error, ProviderHandle, Result};

/// Position and shape of one scan page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanCursor {
    /// Entries sort strictly after this key; empty starts at the first match.
    pub start_key: Key,
    /// Every returned key starts with this prefix.
    pub prefix: Key,
    /// Page size; caps both the request and the answer.
    pub max_keys: u64,
    /// Caller-asserted key capacity; zero negotiates exact sizes.
    pub key_size: u64,
    /// Caller-asserted value capacity; zero negotiates exact sizes.
    pub val_size: u64,
}

impl ScanCursor {
    /// First page of keys starting with `prefix`.
    pub fn new(prefix: &[u8], max_keys: u64) -> Self {
        ScanCursor {
            prefix: prefix.to_vec(),
            max_keys,
            ..Self::default()
        }
    }

    /// Start strictly after `key`.
    pub fn start_after(mut self, key: &[u8]) -> Self {
        self.start_key = key.to_vec();
        self
    }

    /// Skip the sizing pass and use fixed capacities.
    pub fn with_sizes(mut self, key_size: u64, val_size: u64) -> Self {
        self.key_size = key_size;
        self.val_size = val_size;
        self
    }

    /// Move past `last`, the final key of the previous page.
    pub fn advance(&mut self, last: &[u8]) {
        self.start_key = last.to_vec();
    }

    fn sizes_known(&self, with_values: bool) -> bool {
        self.key_size != 0 && (!with_values || self.val_size != 0)
    }
}

/// First entry whose size exceeds its capacity.
fn first_overflow(sizes: &[u64], cap: impl Fn(usize) -> Option<u64>) -> Option<Error> {
    sizes.iter().enumerate().find_map(|(index, &required)| {
        let capacity = cap(index)?;
        (required > capacity).then_some(Error::SizeChanged {
            index,
            capacity,
            required,
        })
    })
}

impl ProviderHandle {
    /// One page of keys, ascending.
    pub fn list_keys(&self, db: DatabaseId, cursor: &ScanCursor) -> Result<Vec<Key>> {
        if cursor.max_keys == 0 {
            return Ok(Vec::new());
        }
        let request = |key_capacities| Request::ListKeys {
            db,
            start_key: cursor.start_key.clone(),
            prefix: cursor.prefix.clone(),
            max_keys: cursor.max_keys,
            key_capacities,
        };

        let caps = if cursor.sizes_known(false) {
            Capacities::Uniform(cursor.key_size)
        } else {
            match self.call_ok(&request(None))? {
                Output::SizeNegotiationRequired { key_sizes, .. } => Capacities::Each(key_sizes),
                other => return Err(unexpected("ListKeys", &other)),
            }
        };
        let page_len = caps.page_len(cursor.max_keys);
        if page_len == 0 {
            return Ok(Vec::new());
        }
        debug!(target: "kvlink::client", %db, entries = page_len, "Key data pass");

        match self.call_ok(&request(Some(caps.clone())))? {
            Output::Keys(keys) if keys.len() as u64 <= page_len => Ok(keys),
            Output::SizeNegotiationRequired { key_sizes, .. } => {
                Err(first_overflow(&key_sizes, |i| caps.get(i)).unwrap_or_else(|| {
                    Error::Communication {
                        reason: "provider renegotiated without an oversized key".into(),
                    }
                }))
            }
            other => Err(unexpected("ListKeys", &other)),
        }
    }

    /// One page of key/value pairs, ascending by key.
    pub fn list_keyvals(&self, db: DatabaseId, cursor: &ScanCursor) -> Result<Vec<(Key, Value)>> {
        if cursor.max_keys == 0 {
            return Ok(Vec::new());
        }
        let request = |capacities| Request::ListKeyvals {
            db,
            start_key: cursor.start_key.clone(),
            prefix: cursor.prefix.clone(),
            max_keys: cursor.max_keys,
            capacities,
        };

        let caps = if cursor.sizes_known(true) {
            Capacities::Uniform((cursor.key_size, cursor.val_size))
        } else {
            match self.call_ok(&request(None))? {
                Output::SizeNegotiationRequired {
                    key_sizes,
                    val_sizes,
                } if key_sizes.len() == val_sizes.len() => {
                    Capacities::Each(key_sizes.into_iter().zip(val_sizes).collect())
                }
                other => return Err(unexpected("ListKeyvals", &other)),
            }
        };
        let page_len = caps.page_len(cursor.max_keys);
        if page_len == 0 {
            return Ok(Vec::new());
        }
        debug!(target: "kvlink::client", %db, entries = page_len, "Key/value data pass");

        match self.call_ok(&request(Some(caps.clone())))? {
            Output::KeyValues(entries) if entries.len() as u64 <= page_len => Ok(entries),
            Output::SizeNegotiationRequired {
                key_sizes,
                val_sizes,
            } => {
                Err(first_overflow(&key_sizes, |i| caps.get(i).map(|(k, _)| k))
                    .or_else(|| first_overflow(&val_sizes, |i| caps.get(i).map(|(_, v)| v)))
                    .unwrap_or_else(|| Error::Communication {
                        reason: "provider renegotiated without an oversized entry".into(),
                    }))
            }
            other => Err(unexpected("ListKeyvals", &other)),
        }
    }

    /// Iterate over every key starting with `prefix`, `page_size` at a time.
    pub fn scan_keys(&self, db: DatabaseId, prefix: &[u8], page_size: u64) -> KeyPages<'_> {
        KeyPages {
            handle: self,
            db,
            pager: Pager::new(prefix, page_size),
        }
    }

    /// Iterate over every pair whose key starts with `prefix`, `page_size`
    /// at a time.
    pub fn scan_keyvals(
        &self,
        db: DatabaseId,
        prefix: &[u8],
        page_size: u64,
    ) -> KeyValuePages<'_> {
        KeyValuePages {
            handle: self,
            db,
            pager: Pager::new(prefix, page_size),
        }
    }
}

/// Pagination state shared by the page iterators.
struct Pager {
    cursor: ScanCursor,
    done: bool,
    /// The previous page ended on the empty key, which cannot serve as a
    /// start key: fetch one extra entry and drop it instead.
    skip_empty: bool,
}

impl Pager {
    fn new(prefix: &[u8], page_size: u64) -> Self {
        Pager {
            cursor: ScanCursor::new(prefix, page_size),
            done: page_size == 0,
            skip_empty: false,
        }
    }

    fn next_page<T>(
        &mut self,
        fetch: impl FnOnce(&ScanCursor) -> Result<Vec<T>>,
        key_of: fn(&T) -> &[u8],
    ) -> Option<Result<Vec<T>>> {
        if self.done {
            return None;
        }
        let result = if self.skip_empty {
            let mut widened = self.cursor.clone();
            widened.max_keys = widened.max_keys.saturating_add(1);
            fetch(&widened).map(|mut page| {
                if page.first().map_or(false, |e| key_of(e).is_empty()) {
                    page.remove(0);
                }
                page.truncate(self.cursor.max_keys as usize);
                page
            })
        } else {
            fetch(&self.cursor)
        };
        self.skip_empty = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        match page.last().map(key_of) {
            Some(last) if page.len() as u64 >= self.cursor.max_keys => {
                if last.is_empty() {
                    self.skip_empty = true;
                } else {
                    self.cursor.advance(last);
                }
            }
            _ => self.done = true,
        }
        debug!(target: "kvlink::client", entries = page.len(), last = self.done, "Scan page");
        if page.is_empty() {
            return None;
        }
        Some(Ok(page))
    }
}

fn key_only(key: &Key) -> &[u8] {
    key
}

fn pair_key(entry: &(Key, Value)) -> &[u8] {
    &entry.0
}

/// Pages of keys; see [`ProviderHandle::scan_keys`].
///
/// Yields each non-empty page once. Iteration ends after a short page or the
/// first error.
pub struct KeyPages<'a> {
    handle: &'a ProviderHandle,
    db: DatabaseId,
    pager: Pager,
}

impl Iterator for KeyPages<'_> {
    type Item = Result<Vec<Key>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (handle, db) = (self.handle, self.db);
        self.pager
            .next_page(|cursor| handle.list_keys(db, cursor), key_only)
    }
}

/// Pages of key/value pairs; see [`ProviderHandle::scan_keyvals`].
pub struct KeyValuePages<'a> {
    handle: &'a ProviderHandle,
    db: DatabaseId,
    pager: Pager,
}

impl Iterator for KeyValuePages<'_> {
    type Item = Result<Vec<(Key, Value)>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (handle, db) = (self.handle, self.db);
        self.pager
            .next_page(|cursor| handle.list_keyvals(db, cursor), pair_key)
    }
}
