//! Snapshot-persisted B-tree used by `embedded_btree` databases.
//!
//! The whole tree lives in memory and is written to `<root>/<name>.btree` as
//! one MessagePack document on `flush` and when the backend is dropped. Writes
//! go to a temporary file first and are renamed into place, so a crash leaves
//! either the previous snapshot or the new one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use kvlink_core::{Error, Key, Result, Value};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{scan_range, Backend};

/// File extension of snapshot databases
pub const SNAPSHOT_EXTENSION: &str = "btree";

/// On-disk document.
#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    version: u8,
    entries: BTreeMap<Key, Value>,
}

const SNAPSHOT_VERSION: u8 = 1;

struct SnapshotState {
    tree: BTreeMap<Key, Value>,
    dirty: bool,
    destroyed: bool,
}

/// In-memory B-tree with whole-file snapshots.
pub struct SnapshotBackend {
    path: PathBuf,
    state: RwLock<SnapshotState>,
}

impl SnapshotBackend {
    /// Open (or create) the snapshot for `name` under `root`.
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        fs::create_dir_all(root)?;
        let path = root.join(format!("{}.{}", name, SNAPSHOT_EXTENSION));
        let tree = if path.exists() {
            let bytes = fs::read(&path)?;
            let snapshot: Snapshot =
                rmp_serde::from_slice(&bytes).map_err(|e| Error::Serialization {
                    reason: format!("{}: {}", path.display(), e),
                })?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(Error::Io {
                    reason: format!(
                        "{}: unsupported snapshot version {}",
                        path.display(),
                        snapshot.version
                    ),
                });
            }
            snapshot.entries
        } else {
            BTreeMap::new()
        };
        debug!(target: "kvlink::backend", path = %path.display(), keys = tree.len(), "Snapshot loaded");

        Ok(SnapshotBackend {
            path,
            state: RwLock::new(SnapshotState {
                tree,
                dirty: false,
                destroyed: false,
            }),
        })
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_snapshot(&self, state: &mut SnapshotState) -> Result<()> {
        if state.destroyed || !state.dirty {
            return Ok(());
        }
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entries: std::mem::take(&mut state.tree),
        };
        let encoded = rmp_serde::to_vec(&snapshot);
        state.tree = snapshot.entries;
        let bytes = encoded.map_err(|e| Error::Serialization {
            reason: e.to_string(),
        })?;

        let tmp = self.path.with_extension(format!("{}.tmp", SNAPSHOT_EXTENSION));
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        state.dirty = false;
        debug!(target: "kvlink::backend", path = %self.path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }
}

impl Backend for SnapshotBackend {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        state.tree.insert(key.to_vec(), value.to_vec());
        state.dirty = true;
        Ok(())
    }

    fn put_multi(&self, entries: &[(Key, Value)]) -> Result<()> {
        let mut state = self.state.write();
        for (k, v) in entries {
            state.tree.insert(k.clone(), v.clone());
        }
        state.dirty = true;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.state.read().tree.get(key).cloned())
    }

    fn length(&self, key: &[u8]) -> Result<Option<u64>> {
        Ok(self.state.read().tree.get(key).map(|v| v.len() as u64))
    }

    fn erase(&self, key: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        if state.tree.remove(key).is_some() {
            state.dirty = true;
        }
        Ok(())
    }

    fn erase_multi(&self, keys: &[Key]) -> Result<()> {
        let mut state = self.state.write();
        for k in keys {
            if state.tree.remove(k).is_some() {
                state.dirty = true;
            }
        }
        Ok(())
    }

    fn scan(&self, start_key: &[u8], prefix: &[u8], max: usize) -> Result<Vec<(Key, Value)>> {
        let state = self.state.read();
        Ok(scan_range(&state.tree, start_key, prefix)
            .take(max)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn len(&self) -> usize {
        self.state.read().tree.len()
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.state.write();
        self.write_snapshot(&mut state)
    }

    fn destroy(&self) -> Result<()> {
        let mut state = self.state.write();
        state.destroyed = true;
        state.tree.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for SnapshotBackend {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let mut taken = SnapshotState {
            tree: std::mem::take(&mut state.tree),
            dirty: state.dirty,
            destroyed: state.destroyed,
        };
        if let Err(e) = self.write_snapshot(&mut taken) {
            warn!(
                target: "kvlink::backend",
                path = %self.path.display(),
                error = %e,
                "Failed to write snapshot on close"
            );
        }
    }
}
