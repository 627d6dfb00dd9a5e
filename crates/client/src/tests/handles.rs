//! Session and handle lifecycle.

use std::sync::Arc;

use kvlink_core::{Address, DatabaseId, ProviderId};
use kvlink_transport::{Instance, Transport};

use super::{env, PROVIDER};
use crate::{Client, ClientConfig, Error};

#[test]
fn test_init_requires_ready_transport() {
    let e = env();
    e.client_instance.finalize();
    let err = Client::init(e.client_instance.clone()).unwrap_err();
    assert!(matches!(err, Error::Init { .. }));
}

#[test]
fn test_ref_incr_then_two_releases_invalidate() {
    let e = env();
    let h = &e.handle;
    assert_eq!(h.ref_count(), 1);
    h.ref_incr().unwrap();
    assert_eq!(h.ref_count(), 2);

    h.release().unwrap();
    h.put(e.db, b"still", b"valid").unwrap();
    h.release().unwrap();
    assert_eq!(h.ref_count(), 0);

    assert_eq!(h.release(), Err(Error::UseAfterRelease));
    assert_eq!(h.ref_incr(), Err(Error::UseAfterRelease));
    assert_eq!(h.get(e.db, b"still"), Err(Error::UseAfterRelease));
}

#[test]
fn test_clones_share_one_count() {
    let e = env();
    let other = e.handle.clone();
    other.ref_incr().unwrap();
    assert_eq!(e.handle.ref_count(), 2);
    e.handle.release().unwrap();
    other.release().unwrap();
    assert_eq!(other.open("db"), Err(Error::UseAfterRelease));
}

#[test]
fn test_live_handles_tracked_by_session() {
    let e = env();
    assert_eq!(e.client.live_handles(), 1);
    let second = e
        .client
        .provider_handle_create(e.server.address(), PROVIDER)
        .unwrap();
    assert_eq!(e.client.live_handles(), 2);
    second.release().unwrap();
    e.handle.release().unwrap();
    assert_eq!(e.client.live_handles(), 0);
}

#[test]
fn test_finalize_closes_live_handles() {
    let e = env();
    let handle = e.handle.clone();
    e.client.finalize();
    assert_eq!(handle.open("db"), Err(Error::SessionClosed));
}

#[test]
fn test_unreachable_provider() {
    let e = env();
    let err = e
        .client
        .provider_handle_create(e.server.address(), ProviderId(99))
        .unwrap_err();
    assert!(matches!(err, Error::UnreachableProvider { .. }));

    let err = e
        .client
        .provider_handle_create(&Address::local("nowhere"), PROVIDER)
        .unwrap_err();
    assert!(matches!(err, Error::UnreachableProvider { .. }));
    assert_eq!(e.client.live_handles(), 1);
}

#[test]
fn test_without_probe_failure_surfaces_on_first_call() {
    let e = env();
    let transport: Arc<dyn Transport> = Instance::new(&e.fabric).unwrap();
    let client = Client::init_with_config(
        transport,
        ClientConfig {
            probe_on_create: false,
        },
    )
    .unwrap();
    let handle = client
        .provider_handle_create(&Address::local("nowhere"), PROVIDER)
        .unwrap();
    assert!(matches!(handle.open("db"), Err(Error::Communication { .. })));
}

#[test]
fn test_lookup_and_open() {
    let e = env();
    let addr = e.client.lookup("server").unwrap();
    assert_eq!(&addr, e.server.address());
    assert_eq!(e.handle.open("db").unwrap(), e.db);
    assert_eq!(e.handle.open("missing").unwrap(), DatabaseId::INVALID);
}

#[test]
fn test_list_databases_reflects_catalog() {
    let e = env();
    let second = e
        .provider
        .add_database("second", "", kvlink_core::DatabaseType::Tree)
        .unwrap();
    assert_eq!(
        e.handle.list_databases().unwrap(),
        vec![("db".to_string(), e.db), ("second".to_string(), second)]
    );
    e.provider.remove_all_databases();
    assert!(e.handle.list_databases().unwrap().is_empty());
}

#[test]
fn test_database_wrapper_holds_a_reference() {
    let e = env();
    {
        let db = e.handle.database("db").unwrap().unwrap();
        assert_eq!(e.handle.ref_count(), 2);
        db.put(b"k", b"v").unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(db.id(), e.db);
    }
    assert_eq!(e.handle.ref_count(), 1);
    assert!(e.handle.database("missing").unwrap().is_none());
    assert_eq!(e.handle.ref_count(), 1);
}

#[test]
fn test_shutdown_service() {
    let e = env();
    assert!(matches!(
        e.client.shutdown_service(e.server.address()),
        Err(Error::Communication { .. })
    ));
    e.server.enable_remote_shutdown();
    e.client.shutdown_service(e.server.address()).unwrap();
    e.server.wait_for_finalize();

    // Local handle state is unchanged; calls now fail in transport.
    assert_eq!(e.handle.ref_count(), 1);
    assert!(matches!(e.handle.open("db"), Err(Error::Communication { .. })));
}
