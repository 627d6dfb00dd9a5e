//! Provider-side errors.
//!
//! Every failure a provider reports is an [`Error`]. Errors are:
//! - **Structured**: each variant has typed fields
//! - **Serializable**: they travel back to the caller inside a `Response`
//! - **Coded**: each variant maps to a stable numeric [`StatusCode`]

use serde::{Deserialize, Serialize};

use crate::types::DatabaseId;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric status reported by a provider.
///
/// `Success` is zero; failures are negative and never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// Call succeeded
    Success,
    /// Argument rejected before touching a database
    InvalidArgument,
    /// Transport failed to deliver the call or its answer
    Transport,
    /// Database could not be created
    DatabaseCreate,
    /// A database with that name already exists
    DatabaseName,
    /// No database with that id
    UnknownDatabase,
    /// No provider with that selector
    UnknownProvider,
    /// Backend write failed
    Put,
    /// Key is not present
    UnknownKey,
    /// A value or key does not fit the buffer the caller announced
    Size,
    /// Backend erase failed
    Erase,
    /// Database migration failed
    Migration,
    /// Request type not supported by this provider
    NotImplemented,
    /// Size or count limit exceeded
    Constraint,
    /// I/O failure inside a backend
    Io,
    /// Frame could not be encoded or decoded
    Serialization,
    /// Invariant violation inside the provider
    Internal,
    /// Database is read-only while it migrates
    Busy,
}

impl StatusCode {
    /// Stable numeric code.
    pub fn code(&self) -> i32 {
        match self {
            StatusCode::Success => 0,
            StatusCode::InvalidArgument => -2,
            StatusCode::Transport => -3,
            StatusCode::DatabaseCreate => -4,
            StatusCode::DatabaseName => -5,
            StatusCode::UnknownDatabase => -6,
            StatusCode::UnknownProvider => -7,
            StatusCode::Put => -8,
            StatusCode::UnknownKey => -9,
            StatusCode::Size => -10,
            StatusCode::Erase => -11,
            StatusCode::Migration => -12,
            StatusCode::NotImplemented => -13,
            StatusCode::Constraint => -14,
            StatusCode::Io => -15,
            StatusCode::Serialization => -16,
            StatusCode::Internal => -17,
            StatusCode::Busy => -18,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// Failure reported by a provider.
///
/// # Categories
///
/// | Category | Variants |
/// |----------|----------|
/// | Not found | `UnknownDatabase`, `UnknownKey` |
/// | Validation | `InvalidArgument`, `ConstraintViolation` |
/// | Negotiation | `SizeMismatch` |
/// | Catalog | `DatabaseExists`, `DatabaseCreate` |
/// | Migration | `Migration`, `DatabaseMigrating` |
/// | System | `Io`, `Serialization`, `Internal` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Not Found ====================
    /// Database id not hosted by this provider
    #[error("unknown database: {id}")]
    UnknownDatabase { id: DatabaseId },

    /// Key absent from the database
    #[error("unknown key")]
    UnknownKey,

    // ==================== Validation ====================
    /// Malformed request
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Configured limit exceeded
    #[error("constraint violation: {reason}")]
    ConstraintViolation { reason: String },

    // ==================== Negotiation ====================
    /// Entry `index` needs `required` bytes but the caller offered `capacity`
    #[error("size mismatch at entry {index}: capacity {capacity}, required {required}")]
    SizeMismatch {
        index: usize,
        capacity: u64,
        required: u64,
    },

    // ==================== Catalog ====================
    /// A database with this name is already hosted
    #[error("database already exists: {name}")]
    DatabaseExists { name: String },

    /// Backend could not be created or opened
    #[error("cannot create database '{name}': {reason}")]
    DatabaseCreate { name: String, reason: String },

    // ==================== Migration ====================
    /// Migration did not complete
    #[error("migration failed: {reason}")]
    Migration { reason: String },

    /// Writes are fenced while the database is shipped elsewhere; retry
    /// once the migration has finished or failed
    #[error("database {id} is migrating")]
    DatabaseMigrating { id: DatabaseId },

    /// Request kind this provider refuses
    #[error("not supported: {reason}")]
    NotSupported { reason: String },

    // ==================== System ====================
    /// Backend I/O failure
    #[error("I/O error: {reason}")]
    Io { reason: String },

    /// Frame encoding or decoding failure
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// Invariant violation
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Status code reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::UnknownDatabase { .. } => StatusCode::UnknownDatabase,
            Error::UnknownKey => StatusCode::UnknownKey,
            Error::InvalidArgument { .. } => StatusCode::InvalidArgument,
            Error::ConstraintViolation { .. } => StatusCode::Constraint,
            Error::SizeMismatch { .. } => StatusCode::Size,
            Error::DatabaseExists { .. } => StatusCode::DatabaseName,
            Error::DatabaseCreate { .. } => StatusCode::DatabaseCreate,
            Error::Migration { .. } => StatusCode::Migration,
            Error::DatabaseMigrating { .. } => StatusCode::Busy,
            Error::NotSupported { .. } => StatusCode::NotImplemented,
            Error::Io { .. } => StatusCode::Io,
            Error::Serialization { .. } => StatusCode::Serialization,
            Error::Internal { .. } => StatusCode::Internal,
        }
    }

    /// Shorthand for an I/O error.
    pub fn io(err: impl std::fmt::Display) -> Self {
        Error::Io {
            reason: err.to_string(),
        }
    }

    /// Shorthand for an internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Error::Internal {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io(e)
    }
}
