//! In-memory ordered backend used by `map` and `tree` databases.

use std::collections::BTreeMap;

use kvlink_core::{Key, Result, Value};
use parking_lot::RwLock;

use super::{scan_range, Backend};

/// Ordered map under a reader/writer lock. Contents die with the database.
#[derive(Default)]
pub struct MemoryBackend {
    map: RwLock<BTreeMap<Key, Value>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.map.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put_multi(&self, entries: &[(Key, Value)]) -> Result<()> {
        let mut map = self.map.write();
        for (k, v) in entries {
            map.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn length(&self, key: &[u8]) -> Result<Option<u64>> {
        Ok(self.map.read().get(key).map(|v| v.len() as u64))
    }

    fn erase(&self, key: &[u8]) -> Result<()> {
        self.map.write().remove(key);
        Ok(())
    }

    fn erase_multi(&self, keys: &[Key]) -> Result<()> {
        let mut map = self.map.write();
        for k in keys {
            map.remove(k);
        }
        Ok(())
    }

    fn scan(&self, start_key: &[u8], prefix: &[u8], max: usize) -> Result<Vec<(Key, Value)>> {
        let map = self.map.read();
        Ok(scan_range(&map, start_key, prefix)
            .take(max)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn scan_keys(&self, start_key: &[u8], prefix: &[u8], max: usize) -> Result<Vec<Key>> {
        let map = self.map.read();
        Ok(scan_range(&map, start_key, prefix)
            .take(max)
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_erase() {
        let b = MemoryBackend::new();
        b.put(b"k", b"v").unwrap();
        assert_eq!(b.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(b.length(b"k").unwrap(), Some(1));
        b.erase(b"k").unwrap();
        b.erase(b"k").unwrap();
        assert_eq!(b.get(b"k").unwrap(), None);
        assert!(b.is_empty());
    }

    #[test]
    fn test_empty_value_is_present() {
        let b = MemoryBackend::new();
        b.put(b"empty", b"").unwrap();
        assert_eq!(b.length(b"empty").unwrap(), Some(0));
        assert_eq!(b.length(b"missing").unwrap(), None);
    }

    #[test]
    fn test_scan_respects_max() {
        let b = MemoryBackend::new();
        let entries: Vec<(Key, Value)> = (0..10u8).map(|i| (vec![b'k', i], vec![i])).collect();
        b.put_multi(&entries).unwrap();
        assert_eq!(b.scan(b"", b"k", 3).unwrap().len(), 3);
        assert_eq!(b.scan_keys(b"", b"k", 100).unwrap().len(), 10);
        assert_eq!(b.entries().unwrap(), entries);
    }
}
