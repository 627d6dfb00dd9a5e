//! # kvlink transport
//!
//! The in-process RPC substrate kvlink runs on.
//!
//! - [`Fabric`]: process-local network of instances keyed by address
//! - [`Instance`]: one endpoint; hosts providers and issues calls
//! - [`Transport`]: the outbound contract clients depend on
//! - [`RequestHandler`]: the inbound contract providers implement
//!
//! Requests and responses are encoded to MessagePack frames on every hop, so
//! providers and clients only share the wire contract from `kvlink-core`.

#![warn(missing_docs)]

mod error;
mod fabric;
mod instance;
mod transport;

pub use error::{Result, TransportError};
pub use fabric::Fabric;
pub use instance::Instance;
pub use transport::{RequestHandler, Transport};
