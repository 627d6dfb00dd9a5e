//! Error conversion from transport and provider errors.

use kvlink_core::Error as RemoteError;
use kvlink_transport::TransportError;

use crate::Error;

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Communication {
            reason: err.to_string(),
        }
    }
}

/// Map a provider failure of a single-entry call.
pub(crate) fn from_remote(err: RemoteError) -> Error {
    match err {
        RemoteError::SizeMismatch {
            index,
            capacity,
            required,
        } => Error::SizeChanged {
            index,
            capacity,
            required,
        },
        RemoteError::Migration { reason } => Error::Migration { reason },
        RemoteError::InvalidArgument { reason } => Error::InvalidArgument { reason },
        other => Error::Provider {
            status: other.status(),
            message: other.to_string(),
        },
    }
}

/// Map a provider failure of a batched call. The whole batch failed.
pub(crate) fn from_remote_batch(err: RemoteError) -> Error {
    match err {
        RemoteError::SizeMismatch { .. } => from_remote(err),
        other => Error::Batch {
            status: other.status(),
            message: other.to_string(),
        },
    }
}

/// Error for an output variant that does not belong to the request.
pub(crate) fn unexpected(request: &str, output: &kvlink_core::Output) -> Error {
    Error::Communication {
        reason: format!("unexpected output {} for {}", output.name(), request),
    }
}
