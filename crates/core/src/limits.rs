//! Size limits for keys, values, batches and scans
//!
//! Limits are enforced by the provider before a request reaches a backend.
//! Violations result in `ConstraintViolation` errors.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Size limits enforced by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum key length in bytes (default: 64KB)
    #[serde(default = "default_max_key_bytes")]
    pub max_key_bytes: usize,

    /// Maximum value length in bytes (default: 16MB)
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,

    /// Maximum number of entries in one batched request (default: 64K)
    #[serde(default = "default_max_batch_len")]
    pub max_batch_len: usize,

    /// Maximum `max_keys` accepted by a single scan page (default: 64K)
    #[serde(default = "default_max_scan_keys")]
    pub max_scan_keys: usize,
}

fn default_max_key_bytes() -> usize {
    64 * 1024
}

fn default_max_value_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_max_batch_len() -> usize {
    64 * 1024
}

fn default_max_scan_keys() -> usize {
    64 * 1024
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: default_max_key_bytes(),
            max_value_bytes: default_max_value_bytes(),
            max_batch_len: default_max_batch_len(),
            max_scan_keys: default_max_scan_keys(),
        }
    }
}

impl Limits {
    /// Small limits for tests that exercise enforcement.
    pub fn with_small_limits() -> Self {
        Limits {
            max_key_bytes: 16,
            max_value_bytes: 64,
            max_batch_len: 8,
            max_scan_keys: 8,
        }
    }

    /// Validate a key length.
    pub fn validate_key(&self, key: &[u8]) -> Result<(), Error> {
        if key.len() > self.max_key_bytes {
            return Err(Error::ConstraintViolation {
                reason: format!(
                    "key of {} bytes exceeds limit of {}",
                    key.len(),
                    self.max_key_bytes
                ),
            });
        }
        Ok(())
    }

    /// Validate a value length.
    pub fn validate_value(&self, value: &[u8]) -> Result<(), Error> {
        if value.len() > self.max_value_bytes {
            return Err(Error::ConstraintViolation {
                reason: format!(
                    "value of {} bytes exceeds limit of {}",
                    value.len(),
                    self.max_value_bytes
                ),
            });
        }
        Ok(())
    }

    /// Validate the number of entries in a batched request.
    pub fn validate_batch(&self, len: usize) -> Result<(), Error> {
        if len > self.max_batch_len {
            return Err(Error::ConstraintViolation {
                reason: format!("batch of {} entries exceeds limit of {}", len, self.max_batch_len),
            });
        }
        Ok(())
    }

    /// Validate the page size of a scan.
    pub fn validate_scan(&self, max_keys: usize) -> Result<(), Error> {
        if max_keys > self.max_scan_keys {
            return Err(Error::ConstraintViolation {
                reason: format!(
                    "scan of {} keys exceeds limit of {}",
                    max_keys, self.max_scan_keys
                ),
            });
        }
        Ok(())
    }
}
