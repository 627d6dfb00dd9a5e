//! Output enum for provider results.
//!
//! Every request produces exactly one output variant on success. The mapping
//! is fixed; only the sizing pass of a scan has two legal answers.

use serde::{Deserialize, Serialize};

use crate::command::{Key, Value};
use crate::error::Error;
use crate::types::DatabaseId;

/// What travels back for every request.
pub type Response = std::result::Result<Output, Error>;

/// Successful provider results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    // ==================== Primitive Results ====================
    /// No return value (put, erase, probe)
    Unit,

    /// Boolean result
    Bool(bool),

    /// Count result
    Count(u64),

    /// Size of one value
    Size(u64),

    /// One value
    Value(Value),

    // ==================== Catalog ====================
    /// Database id (may be `DatabaseId::INVALID` for open)
    DatabaseId(DatabaseId),

    /// Hosted databases, creation order
    Databases(Vec<(String, DatabaseId)>),

    // ==================== Batch ====================
    /// One value per requested key, `None` when absent
    Values(Vec<Option<Value>>),

    /// One size per requested key, `None` when absent
    Sizes(Vec<Option<u64>>),

    /// One presence flag per requested key
    Bools(Vec<bool>),

    // ==================== Scan ====================
    /// Listed keys, ascending
    Keys(Vec<Key>),

    /// Listed pairs, ascending by key
    KeyValues(Vec<(Key, Value)>),

    /// Exact sizes of the entries a scan would return.
    ///
    /// The length of `key_sizes` is the number of matches the provider found,
    /// which may be below the requested `max_keys`. `val_sizes` is empty for
    /// key-only scans.
    SizeNegotiationRequired {
        /// Key size per entry.
        key_sizes: Vec<u64>,
        /// Value size per entry (key/value scans only).
        val_sizes: Vec<u64>,
    },
}

impl Output {
    /// Variant name used in logs and unexpected-output errors.
    pub fn name(&self) -> &'static str {
        match self {
            Output::Unit => "Unit",
            Output::Bool(_) => "Bool",
            Output::Count(_) => "Count",
            Output::Size(_) => "Size",
            Output::Value(_) => "Value",
            Output::DatabaseId(_) => "DatabaseId",
            Output::Databases(_) => "Databases",
            Output::Values(_) => "Values",
            Output::Sizes(_) => "Sizes",
            Output::Bools(_) => "Bools",
            Output::Keys(_) => "Keys",
            Output::KeyValues(_) => "KeyValues",
            Output::SizeNegotiationRequired { .. } => "SizeNegotiationRequired",
        }
    }
}
