//! Database catalog of one provider.
//!
//! Maps provider-scoped [`DatabaseId`]s to open databases. Ids are handed out
//! from a counter starting at 1 and are never reused, so an id that was valid
//! once can only ever resolve to the same database or to nothing.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kvlink_core::{DatabaseId, DatabaseType, Error, Key, Result, Value};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::backend::{backend_file, open_backend};
use crate::database::Database;

/// Names become file names of persistent databases, so they must stay a
/// single path component.
fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "database name must not be empty"
    } else if name.contains(['/', '\\', '\0']) {
        "database name must not contain path separators"
    } else if name.contains("..") || name == "." {
        "database name must not reference a directory"
    } else {
        return Ok(());
    };
    Err(Error::InvalidArgument {
        reason: format!("{}: {:?}", reason, name),
    })
}

/// Databases hosted by a provider, in creation order.
pub struct Catalog {
    databases: RwLock<BTreeMap<DatabaseId, Arc<Database>>>,
    next_id: AtomicU64,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            databases: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a database and open its backend under `root`.
    ///
    /// Errors:
    /// - `InvalidArgument`: empty name, or one that is not a single path
    ///   component
    /// - `DatabaseExists`: the name is taken
    /// - `DatabaseCreate`: the backend could not be opened
    pub fn create(&self, name: &str, db_type: DatabaseType, root: &Path) -> Result<Arc<Database>> {
        validate_name(name)?;
        let mut databases = self.databases.write();
        if databases.values().any(|db| db.name() == name) {
            return Err(Error::DatabaseExists { name: name.into() });
        }
        let backend = open_backend(db_type, name, root).map_err(|e| Error::DatabaseCreate {
            name: name.into(),
            reason: e.to_string(),
        })?;
        let id = DatabaseId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let db = Arc::new(Database::new(
            id,
            name.to_string(),
            db_type,
            root.to_path_buf(),
            backend,
        ));
        databases.insert(id, Arc::clone(&db));
        info!(
            target: "kvlink::provider",
            %id,
            name,
            db_type = db_type.as_str(),
            root = %root.display(),
            "Database added"
        );
        Ok(db)
    }

    /// Create a database already holding `entries`.
    ///
    /// The database only becomes visible once every entry is stored; on
    /// failure nothing is left behind. Unlike [`Catalog::create`], a
    /// persistent database never adopts a file that already exists, which
    /// may belong to a live database or hold stale pairs.
    pub fn create_loaded(
        &self,
        name: &str,
        db_type: DatabaseType,
        root: &Path,
        entries: &[(Key, Value)],
    ) -> Result<Arc<Database>> {
        validate_name(name)?;
        let mut databases = self.databases.write();
        if databases.values().any(|db| db.name() == name) {
            return Err(Error::DatabaseExists { name: name.into() });
        }
        if let Some(file) = backend_file(db_type, name, root) {
            if file.exists() {
                return Err(Error::DatabaseCreate {
                    name: name.into(),
                    reason: format!("{} already exists", file.display()),
                });
            }
        }
        let backend = open_backend(db_type, name, root).map_err(|e| Error::DatabaseCreate {
            name: name.into(),
            reason: e.to_string(),
        })?;
        if let Err(e) = backend.put_multi(entries).and_then(|()| backend.flush()) {
            if let Err(cleanup) = backend.destroy() {
                warn!(target: "kvlink::provider", name, error = %cleanup, "Failed to clean up partial database");
            }
            return Err(e);
        }
        let id = DatabaseId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let db = Arc::new(Database::new(
            id,
            name.to_string(),
            db_type,
            root.to_path_buf(),
            backend,
        ));
        databases.insert(id, Arc::clone(&db));
        info!(
            target: "kvlink::provider",
            %id,
            name,
            keys = entries.len(),
            "Database loaded"
        );
        Ok(db)
    }

    /// Resolve an id.
    pub fn get(&self, id: DatabaseId) -> Result<Arc<Database>> {
        self.databases
            .read()
            .get(&id)
            .cloned()
            .ok_or(Error::UnknownDatabase { id })
    }

    /// Id of the database called `name`.
    pub fn find(&self, name: &str) -> Option<DatabaseId> {
        self.databases
            .read()
            .values()
            .find(|db| db.name() == name)
            .map(|db| db.id())
    }

    /// Detach a database. Persistent files stay on disk.
    pub fn remove(&self, id: DatabaseId) -> Result<Arc<Database>> {
        let db = self
            .databases
            .write()
            .remove(&id)
            .ok_or(Error::UnknownDatabase { id })?;
        if let Err(e) = db.backend().flush() {
            warn!(target: "kvlink::provider", %id, error = %e, "Flush on remove failed");
        }
        info!(target: "kvlink::provider", %id, name = db.name(), "Database removed");
        Ok(db)
    }

    /// Detach a database and delete its files.
    pub fn destroy(&self, id: DatabaseId) -> Result<()> {
        let db = self
            .databases
            .write()
            .remove(&id)
            .ok_or(Error::UnknownDatabase { id })?;
        db.backend().destroy()?;
        info!(target: "kvlink::provider", %id, name = db.name(), "Database destroyed");
        Ok(())
    }

    /// Detach every database, returning how many there were.
    pub fn clear(&self) -> usize {
        let removed = std::mem::take(&mut *self.databases.write());
        for (id, db) in &removed {
            if let Err(e) = db.backend().flush() {
                warn!(target: "kvlink::provider", %id, error = %e, "Flush on remove failed");
            }
        }
        if !removed.is_empty() {
            info!(target: "kvlink::provider", count = removed.len(), "All databases removed");
        }
        removed.len()
    }

    /// Ids in creation order.
    pub fn ids(&self) -> Vec<DatabaseId> {
        self.databases.read().keys().copied().collect()
    }

    /// Up to `max` `(name, id)` pairs in creation order.
    pub fn list(&self, max: usize) -> Vec<(String, DatabaseId)> {
        self.databases
            .read()
            .values()
            .take(max)
            .map(|db| (db.name().to_string(), db.id()))
            .collect()
    }

    /// Every open database.
    pub fn all(&self) -> Vec<Arc<Database>> {
        self.databases.read().values().cloned().collect()
    }

    /// Number of hosted databases.
    pub fn len(&self) -> usize {
        self.databases.read().len()
    }

    /// Whether no database is hosted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ids_are_monotonic_and_not_reused() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new();
        let a = catalog.create("a", DatabaseType::Map, dir.path()).unwrap().id();
        let b = catalog.create("b", DatabaseType::Tree, dir.path()).unwrap().id();
        assert_eq!(a, DatabaseId(1));
        assert_eq!(b, DatabaseId(2));

        catalog.remove(a).unwrap();
        let c = catalog.create("a", DatabaseType::Map, dir.path()).unwrap().id();
        assert_eq!(c, DatabaseId(3));
        assert_eq!(catalog.ids(), vec![b, c]);
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new();
        catalog.create("a", DatabaseType::Map, dir.path()).unwrap();
        assert!(matches!(
            catalog.create("a", DatabaseType::Tree, dir.path()),
            Err(Error::DatabaseExists { .. })
        ));
        assert!(matches!(
            catalog.create("", DatabaseType::Map, dir.path()),
            Err(Error::InvalidArgument { .. })
        ));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_find_and_get() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new();
        let id = catalog.create("users", DatabaseType::Map, dir.path()).unwrap().id();
        assert_eq!(catalog.find("users"), Some(id));
        assert_eq!(catalog.find("nope"), None);
        assert_eq!(catalog.get(id).unwrap().name(), "users");
        assert!(matches!(
            catalog.get(DatabaseId(99)),
            Err(Error::UnknownDatabase { .. })
        ));
    }

    #[test]
    fn test_list_is_bounded_and_ordered() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new();
        for name in ["x", "y", "z"] {
            catalog.create(name, DatabaseType::Map, dir.path()).unwrap();
        }
        let names: Vec<String> = catalog.list(2).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(catalog.list(10).len(), 3);
        assert_eq!(catalog.clear(), 3);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_create_loaded_holds_entries() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new();
        let entries = vec![(b"k".to_vec(), b"v".to_vec())];
        let db = catalog
            .create_loaded("moved", DatabaseType::Log, dir.path(), &entries)
            .unwrap();
        assert_eq!(db.backend().get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(dir.path().join("moved.log").exists());
    }

    #[test]
    fn test_names_must_be_single_path_components() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        let catalog = Catalog::new();
        for name in ["../escaped", "a/b", "a\\b", "..", ".", "nul\0"] {
            assert!(
                matches!(
                    catalog.create(name, DatabaseType::Log, &root),
                    Err(Error::InvalidArgument { .. })
                ),
                "{:?} accepted",
                name
            );
            assert!(matches!(
                catalog.create_loaded(name, DatabaseType::Log, &root, &[]),
                Err(Error::InvalidArgument { .. })
            ));
        }
        assert!(catalog.is_empty());
        assert!(!dir.path().join("escaped.log").exists());
        catalog.create("v1.2", DatabaseType::Log, &root).unwrap();
    }

    #[test]
    fn test_create_loaded_never_adopts_existing_file() {
        let dir = TempDir::new().unwrap();
        let other = Catalog::new();
        let live = other.create("shared", DatabaseType::Log, dir.path()).unwrap();
        live.backend().put(b"mine", b"1").unwrap();

        let catalog = Catalog::new();
        let entries = vec![(b"k".to_vec(), b"v".to_vec())];
        assert!(matches!(
            catalog.create_loaded("shared", DatabaseType::Log, dir.path(), &entries),
            Err(Error::DatabaseCreate { .. })
        ));
        assert!(catalog.is_empty());
        assert_eq!(live.backend().get(b"mine").unwrap(), Some(b"1".to_vec()));
        assert!(dir.path().join("shared.log").exists());

        // Volatile types have no file to collide with.
        catalog
            .create_loaded("shared", DatabaseType::Map, dir.path(), &entries)
            .unwrap();
    }

    #[test]
    fn test_destroy_deletes_files() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new();
        let db = catalog.create("persist", DatabaseType::Log, dir.path()).unwrap();
        db.backend().put(b"k", b"v").unwrap();
        let id = db.id();
        drop(db);
        catalog.destroy(id).unwrap();
        assert!(!dir.path().join("persist.log").exists());
        assert!(catalog.find("persist").is_none());
    }
}
