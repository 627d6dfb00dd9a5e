//! Error types for client operations.
//!
//! Every failure a client call can report is an [`Error`]. Absent keys are
//! never errors; they come back as `None` or `false`.

use kvlink_core::{Address, ProviderId, StatusCode};
use serde::{Deserialize, Serialize};

/// Client-side failures.
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Lifecycle | `Init`, `SessionClosed`, `UseAfterRelease` | Session or handle misuse |
/// | Reachability | `UnreachableProvider`, `Communication` | Transport failures |
/// | Negotiation | `SizeChanged` | Remote entry grew between passes |
/// | Remote | `Batch`, `Migration`, `InvalidArgument`, `Provider` | Provider refused the call |
///
/// # Example
///
/// ```ignore
/// match handle.get(db, b"key") {
///     Ok(Some(value)) => { /* use value */ }
///     Ok(None) => { /* absent */ }
///     Err(Error::SizeChanged { .. }) => { /* retry */ }
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Lifecycle ====================
    /// Transport not usable when the session was created
    #[error("client init failed: {reason}")]
    Init { reason: String },

    /// Session was finalized
    #[error("client session is closed")]
    SessionClosed,

    /// Handle used after its reference count reached zero
    #[error("provider handle used after release")]
    UseAfterRelease,

    // ==================== Reachability ====================
    /// Nothing answers at the address and selector
    #[error("no provider {provider} at {address}")]
    UnreachableProvider {
        address: Address,
        provider: ProviderId,
    },

    /// Transport failed to deliver the call or its answer
    #[error("communication failure: {reason}")]
    Communication { reason: String },

    // ==================== Negotiation ====================
    /// Entry `index` needs `required` bytes; the negotiated capacity was
    /// `capacity`. The caller may retry the whole operation.
    #[error("size changed at entry {index}: capacity {capacity}, required {required}")]
    SizeChanged {
        index: usize,
        capacity: u64,
        required: u64,
    },

    // ==================== Remote ====================
    /// A batched call failed as a whole
    #[error("batch failed ({status}): {message}")]
    Batch { status: StatusCode, message: String },

    /// Database migration failed
    #[error("migration failed: {reason}")]
    Migration { reason: String },

    /// Argument rejected
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Any other provider failure
    #[error("provider error ({status}): {message}")]
    Provider { status: StatusCode, message: String },
}

impl Error {
    /// Whether repeating the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::SizeChanged { .. }
                | Error::Communication { .. }
                | Error::Provider {
                    status: StatusCode::Busy,
                    ..
                }
        )
    }

    /// Numeric status of a remote failure, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Batch { status, .. } | Error::Provider { status, .. } => Some(*status),
            Error::SizeChanged { .. } => Some(StatusCode::Size),
            Error::Migration { .. } => Some(StatusCode::Migration),
            Error::InvalidArgument { .. } => Some(StatusCode::InvalidArgument),
            Error::Communication { .. } => Some(StatusCode::Transport),
            Error::UnreachableProvider { .. } => Some(StatusCode::UnknownProvider),
            _ => None,
        }
    }
}
