//! Moving databases between servers.

use std::sync::Arc;

use kvlink::{
    DatabaseId, DatabaseType, Instance, Provider, ProviderConfig, ProviderHandle, ProviderId,
};
use kvlink::Transport;
use tempfile::TempDir;

use crate::{key, temp_cluster, Cluster};

const DEST: ProviderId = ProviderId(3);

struct Destination {
    _dir: TempDir,
    server: Arc<Instance>,
    provider: Arc<Provider>,
    handle: ProviderHandle,
}

fn destination(c: &Cluster, config: impl FnOnce(&TempDir) -> ProviderConfig) -> Destination {
    let dir = TempDir::new().unwrap();
    let server = Instance::bind(&c.fabric, "dest").unwrap();
    let provider = Provider::register_with_config(&server, DEST, config(&dir)).unwrap();
    let handle = c.client.provider_handle_create(server.address(), DEST).unwrap();
    Destination {
        _dir: dir,
        server,
        provider,
        handle,
    }
}

#[test]
fn remove_origin_moves_database_to_destination() {
    let (src_dir, c) = temp_cluster();
    let dest = destination(&c, |d| ProviderConfig::with_root(d.path()));
    let db = c.database("users", DatabaseType::Log);
    let entries: Vec<(Vec<u8>, Vec<u8>)> = (0..50u32)
        .map(|i| (format!("user:{i:03}").into_bytes(), i.to_le_bytes().to_vec()))
        .collect();
    c.handle.put_multi(db, entries.clone()).unwrap();

    let new_id = c
        .handle
        .migrate_database(db, dest.server.address(), DEST, "", true)
        .unwrap();

    assert_eq!(c.handle.open("users").unwrap(), DatabaseId::INVALID);
    assert!(c.provider.databases().is_empty());
    assert!(!src_dir.path().join("users.log").exists());

    assert_eq!(dest.handle.open("users").unwrap(), new_id);
    let info = dest.provider.database_info(new_id).unwrap();
    assert_eq!(info.db_type, DatabaseType::Log);
    assert_eq!(info.keys, 50);
    let moved: Vec<_> = dest
        .handle
        .scan_keyvals(new_id, b"user:", 16)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
        .concat();
    assert_eq!(moved, entries);
}

#[test]
fn keep_origin_copies_database() {
    let (_dir, c) = temp_cluster();
    let dest = destination(&c, |d| ProviderConfig::with_root(d.path()));
    let db = c.database("copied", DatabaseType::Map);
    c.handle.put(db, b"k", b"v").unwrap();

    let new_id = c
        .handle
        .migrate_database(db, dest.server.address(), DEST, "", false)
        .unwrap();

    c.handle.put(db, b"k", b"changed").unwrap();
    assert_eq!(dest.handle.get(new_id, b"k").unwrap(), Some(b"v".to_vec()));
    assert_eq!(c.handle.get(db, b"k").unwrap(), Some(b"changed".to_vec()));
}

#[test]
fn refused_migration_changes_nothing() {
    let (_dir, c) = temp_cluster();
    let dest = destination(&c, |d| ProviderConfig {
        accept_migrations: false,
        ..ProviderConfig::with_root(d.path())
    });
    let db = c.database("pinned", DatabaseType::Map);
    c.handle.put(db, b"k", b"v").unwrap();

    let err = c
        .handle
        .migrate_database(db, dest.server.address(), DEST, "", true)
        .unwrap_err();
    assert!(matches!(err, kvlink::Error::Migration { .. }));

    assert_eq!(c.handle.open("pinned").unwrap(), db);
    assert_eq!(c.handle.get(db, b"k").unwrap(), Some(b"v".to_vec()));
    assert!(dest.provider.databases().is_empty());
    assert_eq!(dest.handle.open("pinned").unwrap(), DatabaseId::INVALID);
}

#[test]
fn database_wrapper_follows_the_move() {
    let (_dir, c) = temp_cluster();
    let dest = destination(&c, |d| ProviderConfig::with_root(d.path()));
    c.database("wrapped", DatabaseType::EmbeddedBtree);
    let db = c.handle.database("wrapped").unwrap().unwrap();
    db.put_multi(vec![(key("a"), key("1")), (key("b"), key("2"))])
        .unwrap();

    let new_id = db.migrate(dest.server.address(), DEST, "", true).unwrap();
    assert_eq!(c.handle.ref_count(), 1);
    assert_eq!(
        dest.handle.get_multi(new_id, &[key("a"), key("b")]).unwrap(),
        vec![Some(key("1")), Some(key("2"))]
    );
}
