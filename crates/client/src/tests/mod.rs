//! Test modules for the client crate.

pub mod handles;

use std::sync::Arc;

use kvlink_core::{DatabaseId, DatabaseType, ProviderId};
use kvlink_provider::Provider;
use kvlink_transport::{Fabric, Instance, Transport};

use crate::{Client, ProviderHandle};

/// A server hosting one `map` database and a client connected to it.
pub(crate) struct Env {
    pub fabric: Arc<Fabric>,
    pub server: Arc<Instance>,
    pub provider: Arc<Provider>,
    pub client_instance: Arc<Instance>,
    pub client: Client,
    pub handle: ProviderHandle,
    pub db: DatabaseId,
}

pub(crate) const PROVIDER: ProviderId = ProviderId(1);

pub(crate) fn env() -> Env {
    let fabric = Fabric::new();
    let server = Instance::bind(&fabric, "server").unwrap();
    let provider = Provider::register(&server, PROVIDER).unwrap();
    let db = provider.add_database("db", "", DatabaseType::Map).unwrap();

    let client_instance = Instance::new(&fabric).unwrap();
    let client = Client::init(client_instance.clone()).unwrap();
    let handle = client
        .provider_handle_create(server.address(), PROVIDER)
        .unwrap();
    Env {
        fabric,
        server,
        provider,
        client_instance,
        client,
        handle,
        db,
    }
}
