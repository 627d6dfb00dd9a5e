//! Core types for kvlink
//!
//! This crate defines the contract shared by clients, providers and the
//! transport:
//! - Identifiers: [`Address`], [`ProviderId`], [`DatabaseId`], [`DatabaseType`]
//! - [`Request`]/[`Output`]: the call/response instruction set
//! - [`Error`]/[`StatusCode`]: provider failures and their numeric codes
//! - [`Limits`]: size limits enforced by providers
//! - [`codec`]: MessagePack framing used on the wire

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod command;
pub mod error;
pub mod limits;
pub mod output;
pub mod types;

pub use command::{Capacities, Key, Request, Value};
pub use error::{Error, Result, StatusCode};
pub use limits::Limits;
pub use output::{Output, Response};
pub use types::{Address, DatabaseId, DatabaseType, ProviderId};
