//! kvlink end-to-end tests
//!
//! Every test drives a provider on one transport instance from a client on
//! another, through the public `kvlink` facade only.
//!
//! ## Test Organization
//!
//! - `properties`: key/value, batch and scan guarantees on every backend
//! - `persistence`: persistent databases across provider restarts
//! - `migration`: moving databases between servers
//! - `concurrency`: several clients on one database
//! - `lifecycle`: handles, sessions and remote shutdown
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all end-to-end tests
//! cargo test --test kvlink_integration
//!
//! # Run one area
//! cargo test --test kvlink_integration migration::
//! ```

use std::path::Path;
use std::sync::Arc;

use kvlink::{
    Client, DatabaseId, DatabaseType, Fabric, Instance, Provider, ProviderConfig, ProviderHandle,
    ProviderId,
};
use kvlink::Transport;
use tempfile::TempDir;

pub mod concurrency;
pub mod lifecycle;
pub mod migration;
pub mod persistence;
pub mod properties;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

pub const SELECTOR: ProviderId = ProviderId(1);

/// A server instance with one provider, plus a connected client.
pub struct Cluster {
    pub fabric: Arc<Fabric>,
    pub server: Arc<Instance>,
    pub provider: Arc<Provider>,
    pub client: Client,
    pub handle: ProviderHandle,
}

impl Cluster {
    /// Provider rooted at `root` for persistent databases.
    pub fn new(root: &Path) -> Self {
        Self::with_config(ProviderConfig::with_root(root))
    }

    pub fn with_config(config: ProviderConfig) -> Self {
        let fabric = Fabric::new();
        let server = Instance::bind(&fabric, "server").expect("bind server");
        let provider =
            Provider::register_with_config(&server, SELECTOR, config).expect("register provider");
        let client = Client::init(Instance::new(&fabric).expect("client instance"))
            .expect("client init");
        let handle = client
            .provider_handle_create(server.address(), SELECTOR)
            .expect("provider handle");
        Cluster {
            fabric,
            server,
            provider,
            client,
            handle,
        }
    }

    /// Add a database of `db_type` under the provider's default root.
    pub fn database(&self, name: &str, db_type: DatabaseType) -> DatabaseId {
        self.provider
            .add_database(name, "", db_type)
            .expect("add database")
    }
}

/// Cluster plus the directory backing its persistent databases.
pub fn temp_cluster() -> (TempDir, Cluster) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let cluster = Cluster::new(dir.path());
    (dir, cluster)
}

pub fn key(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}
