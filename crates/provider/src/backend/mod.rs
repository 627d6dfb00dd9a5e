//! Storage backends behind a database.
//!
//! A backend is selected once, when the database is created, from its
//! [`DatabaseType`]. After that the provider only talks to the [`Backend`]
//! trait. All backends keep keys ordered so prefix scans can walk a range.

mod log;
mod memory;
mod snapshot;

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use kvlink_core::{DatabaseType, Key, Result, Value};

pub use self::log::{LogBackend, LOG_EXTENSION};
pub use self::memory::MemoryBackend;
pub use self::snapshot::{SnapshotBackend, SNAPSHOT_EXTENSION};

/// Operations every backend provides.
///
/// Implementations are internally synchronized; the provider calls them from
/// whichever thread delivered the request.
pub trait Backend: Send + Sync {
    /// Insert or replace one pair.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Insert or replace several pairs. Either all are applied or none.
    fn put_multi(&self, entries: &[(Key, Value)]) -> Result<()>;

    /// Fetch a value.
    fn get(&self, key: &[u8]) -> Result<Option<Value>>;

    /// Size of a value without copying it out.
    fn length(&self, key: &[u8]) -> Result<Option<u64>>;

    /// Remove a key; absent keys are ignored.
    fn erase(&self, key: &[u8]) -> Result<()>;

    /// Remove several keys; absent keys are ignored.
    fn erase_multi(&self, keys: &[Key]) -> Result<()>;

    /// Up to `max` pairs whose key starts with `prefix` and sorts after
    /// `start_key` (from the first match when `start_key` is empty).
    fn scan(&self, start_key: &[u8], prefix: &[u8], max: usize) -> Result<Vec<(Key, Value)>>;

    /// Same as `scan`, keys only.
    fn scan_keys(&self, start_key: &[u8], prefix: &[u8], max: usize) -> Result<Vec<Key>> {
        Ok(self
            .scan(start_key, prefix, max)?
            .into_iter()
            .map(|(k, _)| k)
            .collect())
    }

    /// Every pair, ascending.
    fn entries(&self) -> Result<Vec<(Key, Value)>> {
        self.scan(&[], &[], usize::MAX)
    }

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// Whether the backend holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make buffered state durable.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Delete any files the backend owns. The backend must not be used after.
    fn destroy(&self) -> Result<()> {
        Ok(())
    }
}

/// Open the backend for a database.
///
/// In-memory types ignore `root`; persistent types keep their file under
/// `root/<name>.<ext>` and reload it if it already exists.
pub fn open_backend(db_type: DatabaseType, name: &str, root: &Path) -> Result<Box<dyn Backend>> {
    Ok(match db_type {
        DatabaseType::Map | DatabaseType::Tree => Box::new(MemoryBackend::new()),
        DatabaseType::Log => Box::new(LogBackend::open(root, name)?),
        DatabaseType::EmbeddedBtree => Box::new(SnapshotBackend::open(root, name)?),
    })
}

/// File a persistent database of this type keeps under `root`; `None` for
/// in-memory types.
pub fn backend_file(db_type: DatabaseType, name: &str, root: &Path) -> Option<PathBuf> {
    let ext = match db_type {
        DatabaseType::Map | DatabaseType::Tree => return None,
        DatabaseType::Log => LOG_EXTENSION,
        DatabaseType::EmbeddedBtree => SNAPSHOT_EXTENSION,
    };
    Some(root.join(format!("{}.{}", name, ext)))
}

/// Walk an ordered map with scan semantics.
///
/// Keys sharing `prefix` form one contiguous range, so the walk starts at the
/// later of `prefix` (inclusive) and `start_key` (exclusive) and stops at the
/// first key outside the prefix.
pub(crate) fn scan_range<'a>(
    map: &'a BTreeMap<Key, Value>,
    start_key: &'a [u8],
    prefix: &'a [u8],
) -> impl Iterator<Item = (&'a Key, &'a Value)> + 'a {
    let lower: Bound<&[u8]> = if start_key.is_empty() || start_key < prefix {
        Bound::Included(prefix)
    } else {
        Bound::Excluded(start_key)
    };
    map.range::<[u8], _>((lower, Bound::Unbounded))
        .take_while(move |(k, _)| k.starts_with(prefix))
}
