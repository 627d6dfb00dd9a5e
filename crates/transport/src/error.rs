//! Transport errors.

use kvlink_core::{Address, ProviderId};

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Failures raised by the fabric itself, before or after a provider runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No instance is bound at the address
    #[error("no instance at {address}")]
    NoSuchAddress { address: Address },

    /// The instance exists but nothing is registered under the selector
    #[error("no provider {provider} at {address}")]
    NoProvider {
        address: Address,
        provider: ProviderId,
    },

    /// The instance was finalized
    #[error("instance {address} is finalized")]
    Finalized { address: Address },

    /// Another instance is already bound at the address
    #[error("address already in use: {address}")]
    AddressInUse { address: Address },

    /// Another provider already uses the selector on this instance
    #[error("provider {provider} already registered at {address}")]
    ProviderInUse {
        address: Address,
        provider: ProviderId,
    },

    /// The target instance did not enable remote shutdown
    #[error("remote shutdown refused by {address}")]
    ShutdownRefused { address: Address },

    /// A frame could not be encoded or decoded
    #[error("codec error: {reason}")]
    Codec { reason: String },
}

impl From<kvlink_core::Error> for TransportError {
    fn from(e: kvlink_core::Error) -> Self {
        TransportError::Codec {
            reason: e.to_string(),
        }
    }
}
