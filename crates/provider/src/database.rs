//! A hosted database: identity plus the backend that stores its pairs.

use std::path::{Path, PathBuf};

use kvlink_core::{DatabaseId, DatabaseType, Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::backend::Backend;

/// One database hosted by a provider.
///
/// Writes go through [`Database::write`], which a migration can fence: while
/// fenced, reads still succeed and writes fail with `DatabaseMigrating`.
pub struct Database {
    id: DatabaseId,
    name: String,
    db_type: DatabaseType,
    path: PathBuf,
    backend: Box<dyn Backend>,
    fenced: RwLock<bool>,
}

impl Database {
    pub(crate) fn new(
        id: DatabaseId,
        name: String,
        db_type: DatabaseType,
        path: PathBuf,
        backend: Box<dyn Backend>,
    ) -> Self {
        Database {
            id,
            name,
            db_type,
            path,
            backend,
            fenced: RwLock::new(false),
        }
    }

    /// Provider-scoped identifier.
    pub fn id(&self) -> DatabaseId {
        self.id
    }

    /// Name the database was created under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend kind.
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// Directory holding the database's files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Storage operations.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Run a mutation unless the database is fenced. The fence cannot be
    /// raised while a mutation is running.
    pub fn write<T>(&self, op: impl FnOnce(&dyn Backend) -> Result<T>) -> Result<T> {
        let fenced = self.fenced.read();
        if *fenced {
            return Err(Error::DatabaseMigrating { id: self.id });
        }
        op(self.backend.as_ref())
    }

    /// Reject writes from now on. Returns once in-flight writes have
    /// finished; fails if the database is already fenced.
    pub(crate) fn fence(&self) -> Result<()> {
        let mut fenced = self.fenced.write();
        if *fenced {
            return Err(Error::DatabaseMigrating { id: self.id });
        }
        *fenced = true;
        Ok(())
    }

    /// Accept writes again.
    pub(crate) fn unfence(&self) {
        *self.fenced.write() = false;
    }

    /// Whether writes are currently rejected.
    pub fn is_fenced(&self) -> bool {
        *self.fenced.read()
    }

    /// Descriptive snapshot of this database.
    pub fn info(&self) -> DatabaseInfo {
        DatabaseInfo {
            id: self.id,
            name: self.name.clone(),
            db_type: self.db_type,
            path: self.path.clone(),
            keys: self.backend.len() as u64,
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("db_type", &self.db_type)
            .field("path", &self.path)
            .finish()
    }
}

/// Description of a hosted database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Provider-scoped identifier
    pub id: DatabaseId,
    /// Name
    pub name: String,
    /// Backend kind
    pub db_type: DatabaseType,
    /// Directory holding the database's files
    pub path: PathBuf,
    /// Number of stored keys
    pub keys: u64,
}
