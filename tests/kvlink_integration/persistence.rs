//! Persistent databases across provider restarts.

use kvlink::{DatabaseType, ProviderConfig, ScanCursor, CONFIG_FILE_NAME};
use tempfile::TempDir;

use crate::{key, Cluster};

fn survives_restart(db_type: DatabaseType) {
    let dir = TempDir::new().unwrap();
    {
        let c = Cluster::new(dir.path());
        let db = c.database("durable", db_type);
        c.handle.put(db, b"a", b"1").unwrap();
        c.handle.put(db, b"b", b"2").unwrap();
        c.handle.put(db, b"a", b"11").unwrap();
        c.handle.erase(db, b"b").unwrap();
        c.handle.put(db, b"c", b"").unwrap();
        c.provider.flush_all().unwrap();
    }

    let c = Cluster::new(dir.path());
    let db = c.database("durable", db_type);
    assert_eq!(c.handle.get(db, b"a").unwrap(), Some(b"11".to_vec()));
    assert_eq!(c.handle.get(db, b"b").unwrap(), None);
    assert_eq!(c.handle.get(db, b"c").unwrap(), Some(Vec::new()));
    assert_eq!(
        c.handle.list_keys(db, &ScanCursor::new(b"", 10)).unwrap(),
        vec![key("a"), key("c")]
    );
}

#[test]
fn log_database_survives_restart() {
    survives_restart(DatabaseType::Log);
}

#[test]
fn embedded_btree_database_survives_restart() {
    survives_restart(DatabaseType::EmbeddedBtree);
}

#[test]
fn snapshot_written_on_drop_without_flush() {
    let dir = TempDir::new().unwrap();
    {
        let c = Cluster::new(dir.path());
        let db = c.database("dropped", DatabaseType::EmbeddedBtree);
        c.handle.put(db, b"k", b"v").unwrap();
    }
    let c = Cluster::new(dir.path());
    let db = c.database("dropped", DatabaseType::EmbeddedBtree);
    assert_eq!(c.handle.get(db, b"k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn in_memory_database_starts_empty_after_restart() {
    let dir = TempDir::new().unwrap();
    {
        let c = Cluster::new(dir.path());
        let db = c.database("volatile", DatabaseType::Map);
        c.handle.put(db, b"k", b"v").unwrap();
    }
    let c = Cluster::new(dir.path());
    let db = c.database("volatile", DatabaseType::Map);
    assert_eq!(c.handle.get(db, b"k").unwrap(), None);
}

#[test]
fn provider_rooted_by_config_file() {
    let dir = TempDir::new().unwrap();
    let config = ProviderConfig::load_or_create(dir.path()).unwrap();
    assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    assert_eq!(config.default_root, dir.path());

    {
        let c = Cluster::with_config(config.clone());
        let db = c.database("configured", DatabaseType::Log);
        c.handle.put(db, b"k", b"v").unwrap();
        let info = c.provider.database_info(db).unwrap();
        assert!(info.path.starts_with(dir.path()));
    }

    let reloaded = ProviderConfig::load_or_create(dir.path()).unwrap();
    assert_eq!(reloaded, config);
    let c = Cluster::with_config(reloaded);
    let db = c.database("configured", DatabaseType::Log);
    assert_eq!(c.handle.get(db, b"k").unwrap(), Some(b"v".to_vec()));
}
