//! Test modules for the provider crate.


use std::sync::Arc;

use kvlink_core::{DatabaseId, DatabaseType, ProviderId};
use kvlink_transport::{Fabric, Instance};

use crate::{Provider, ProviderConfig};

/// A provider hosting one empty `map` database, plus the instance keeping it
/// reachable.
pub(crate) fn provider_with_db(config: ProviderConfig) -> (Arc<Instance>, Arc<Provider>, DatabaseId) {
    let fabric = Fabric::new();
    let instance = Instance::new(&fabric).unwrap();
    let provider = Provider::register_with_config(&instance, ProviderId(1), config).unwrap();
    let db = provider.add_database("db", "", DatabaseType::Map).unwrap();
    (instance, provider, db)
}
