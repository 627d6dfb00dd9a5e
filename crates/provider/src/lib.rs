//! # kvlink provider
//!
//! The server side of kvlink: a [`Provider`] registers on a transport
//! instance under an 8-bit selector, hosts named databases and answers the
//! requests defined in `kvlink-core`.
//!
//! ```text
//! let fabric = Fabric::new();
//! let server = Instance::bind(&fabric, "server")?;
//! let provider = Provider::register(&server, ProviderId(1))?;
//! provider.add_database("users", "", DatabaseType::Map)?;
//! server.wait_for_finalize();
//! ```
//!
//! ## Database Types
//!
//! | Type | Storage |
//! |------|---------|
//! | `map`, `tree` | ordered in-memory map |
//! | `log` | append-only CRC-framed file, replayed on open |
//! | `embedded_btree` | in-memory B-tree snapshotted to a file |

#![warn(missing_docs)]

pub mod backend;
mod catalog;
mod config;
mod database;
mod executor;
mod handlers;
mod provider;

#[cfg(test)]
mod tests;

pub use config::{ProviderConfig, CONFIG_FILE_NAME};
pub use database::{Database, DatabaseInfo};
pub use provider::Provider;

pub use kvlink_core::{DatabaseId, DatabaseType, Error, ProviderId, Result};
