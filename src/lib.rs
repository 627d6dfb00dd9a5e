//! kvlink - remote key/value databases over an RPC fabric
//!
//! A [`Provider`] registers on a transport [`Instance`] and hosts named
//! databases. A [`Client`] reaches providers through reference-counted
//! [`ProviderHandle`]s and reads, writes, scans and migrates their databases.
//!
//! # Quick Start
//!
//! ```ignore
//! use kvlink::{Client, DatabaseType, Fabric, Instance, Provider, ProviderId};
//!
//! let fabric = Fabric::new();
//! let server = Instance::bind(&fabric, "server")?;
//! let provider = Provider::register(&server, ProviderId(1))?;
//! provider.add_database("users", "", DatabaseType::Map)?;
//!
//! let client = Client::init(Instance::new(&fabric)?)?;
//! let handle = client.provider_handle_create(server.address(), ProviderId(1))?;
//! let db = handle.open("users")?;
//! handle.put(db, b"alice", b"42")?;
//! assert_eq!(handle.get(db, b"alice")?, Some(b"42".to_vec()));
//! ```
//!
//! # Architecture
//!
//! Every client call becomes a `Request` frame carried by the transport to
//! the provider's executor, which answers with an `Output` or a provider
//! error. Only the client, provider and transport entry points are
//! re-exported here; the wire contract lives in `kvlink-core`.

pub use kvlink_client::{
    Client, ClientConfig, Database, Error, KeyPages, KeyValuePages, ProviderHandle, Result,
    ScanCursor,
};
pub use kvlink_core::{Address, DatabaseId, DatabaseType, Key, ProviderId, StatusCode, Value};
pub use kvlink_provider::{DatabaseInfo, Provider, ProviderConfig, CONFIG_FILE_NAME};
pub use kvlink_transport::{Fabric, Instance, Transport, TransportError};
