//! Handles, sessions and remote shutdown.

use std::sync::mpsc;
use std::thread;

use kvlink::{Client, DatabaseType, Error, Fabric, Instance, Provider};
use kvlink::Transport;

use crate::{temp_cluster, SELECTOR};

#[test]
fn server_thread_runs_until_remote_shutdown() {
    let fabric = Fabric::new();
    let (ready_tx, ready_rx) = mpsc::channel();
    let server_fabric = fabric.clone();
    let server = thread::spawn(move || {
        let instance = Instance::bind(&server_fabric, "kv-server").unwrap();
        let provider = Provider::register(&instance, SELECTOR).unwrap();
        provider.add_database("sessions", "", DatabaseType::Map).unwrap();
        instance.enable_remote_shutdown();
        ready_tx.send(()).unwrap();
        instance.wait_for_finalize();
    });
    ready_rx.recv().unwrap();

    let client = Client::init(Instance::new(&fabric).unwrap()).unwrap();
    let address = client.lookup("kv-server").unwrap();
    let handle = client.provider_handle_create(&address, SELECTOR).unwrap();
    let db = handle.open("sessions").unwrap();
    assert!(db.is_valid());
    handle.put(db, b"token", b"abc").unwrap();
    assert_eq!(handle.get(db, b"token").unwrap(), Some(b"abc".to_vec()));

    client.shutdown_service(&address).unwrap();
    server.join().unwrap();

    assert!(matches!(handle.get(db, b"token"), Err(Error::Communication { .. })));
    assert!(matches!(
        client.provider_handle_create(&address, SELECTOR),
        Err(Error::UnreachableProvider { .. })
    ));
    handle.release().unwrap();
    client.finalize();
}

#[test]
fn ref_count_contract() {
    let (_dir, c) = temp_cluster();
    let db = c.database("counted", DatabaseType::Map);
    let h = &c.handle;

    h.ref_incr().unwrap();
    h.release().unwrap();
    h.put(db, b"k", b"v").unwrap();
    h.release().unwrap();
    assert_eq!(h.release(), Err(Error::UseAfterRelease));
    assert_eq!(h.get(db, b"k"), Err(Error::UseAfterRelease));

    // A fresh handle to the same provider is unaffected.
    let fresh = c
        .client
        .provider_handle_create(c.server.address(), SELECTOR)
        .unwrap();
    assert_eq!(fresh.get(db, b"k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn finalized_session_rejects_everything() {
    let (_dir, c) = temp_cluster();
    let db = c.database("closing", DatabaseType::Map);
    let handle = c.handle.clone();
    c.client.finalize();

    assert_eq!(handle.put(db, b"k", b"v"), Err(Error::SessionClosed));
    assert_eq!(handle.list_databases(), Err(Error::SessionClosed));
    assert!(c.provider.databases().contains(&db));
}
