//! # kvlink client
//!
//! Access layer for databases hosted by remote kvlink providers.
//!
//! - [`Client`]: session bound to one transport instance
//! - [`ProviderHandle`]: reference-counted handle to a provider; every
//!   key/value, batch, scan and migration operation is a method on it
//! - [`Database`]: a handle bound to one database id
//!
//! ## Quick Start
//!
//! ```text
//! let client = Client::init(instance)?;
//! let address = client.lookup("server")?;
//! let handle = client.provider_handle_create(&address, ProviderId(1))?;
//!
//! let db = handle.open("users")?;
//! handle.put(db, b"alice", b"42")?;
//! assert_eq!(handle.get(db, b"alice")?, Some(b"42".to_vec()));
//!
//! for page in handle.scan_keys(db, b"al", 100) {
//!     println!("{:?}", page?);
//! }
//!
//! handle.release()?;
//! client.finalize();
//! ```
//!
//! ## Unknown Sizes
//!
//! Value and key sizes are not known until asked. Reads negotiate sizes in a
//! first pass and fetch with exact capacities in a second. The second pass is
//! authoritative: an entry that grew in between fails with
//! [`Error::SizeChanged`] and is never truncated.

#![warn(missing_docs)]

mod api;
mod convert;
mod database;
mod error;
mod handle;
mod session;

#[cfg(test)]
mod tests;

pub use api::{KeyPages, KeyValuePages, ScanCursor};
pub use database::Database;
pub use error::Error;
pub use handle::ProviderHandle;
pub use session::{Client, ClientConfig};

pub use kvlink_core::{Address, DatabaseId, Key, ProviderId, StatusCode, Value};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;
