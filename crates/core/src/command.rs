//! Request enum defining every call a provider answers.
//!
//! Requests are the instruction set of the wire contract:
//! - **Self-contained**: all parameters travel in the variant
//! - **Serializable**: the transport encodes them as frames
//! - **Size-aware**: fetch requests announce the buffer capacity the caller
//!   allocated, so the provider can refuse instead of truncating

use serde::{Deserialize, Serialize};

use crate::types::{Address, DatabaseId, DatabaseType, ProviderId};

/// Key bytes.
pub type Key = Vec<u8>;

/// Value bytes.
pub type Value = Vec<u8>;

/// Buffer capacities announced by a scan data pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capacities<T> {
    /// One capacity for every entry of the page; the page may hold up to
    /// `max_keys` entries.
    Uniform(T),
    /// One capacity per entry, in page order; the page holds at most this
    /// many entries.
    Each(Vec<T>),
}

impl<T: Copy> Capacities<T> {
    /// Capacity of entry `index`, if the page has room for it.
    pub fn get(&self, index: usize) -> Option<T> {
        match self {
            Capacities::Uniform(cap) => Some(*cap),
            Capacities::Each(caps) => caps.get(index).copied(),
        }
    }

    /// Entries a page of `max_keys` may return under these capacities.
    pub fn page_len(&self, max_keys: u64) -> u64 {
        match self {
            Capacities::Uniform(_) => max_keys,
            Capacities::Each(caps) => (caps.len() as u64).min(max_keys),
        }
    }
}

/// A call addressed to one provider.
///
/// # Request Categories
///
/// | Category | Count | Description |
/// |----------|-------|-------------|
/// | Catalog | 4 | Probe, open by name, database enumeration |
/// | Single key | 5 | put/get/length/exists/erase |
/// | Batch | 5 | Multi-key variants, one round trip each |
/// | Scan | 2 | Prefix enumeration of keys or key/value pairs |
/// | Migration | 2 | Outbound database move and its inbound half |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Request {
    // ==================== Catalog (4) ====================
    /// Check that a provider answers at this selector.
    /// Returns: `Output::Unit`
    Probe,

    /// Resolve a database by name.
    /// Returns: `Output::DatabaseId` (`DatabaseId::INVALID` when absent)
    Open { name: String },

    /// Number of hosted databases.
    /// Returns: `Output::Count`
    CountDatabases,

    /// Up to `max` hosted databases, in creation order.
    /// Returns: `Output::Databases`
    ListDatabases { max: u64 },

    // ==================== Single key (5) ====================
    /// Store a value, replacing any previous one.
    /// Returns: `Output::Unit`
    Put {
        db: DatabaseId,
        key: Key,
        value: Value,
    },

    /// Fetch a value into a buffer of `capacity` bytes.
    /// Returns: `Output::Value`; `Error::UnknownKey` when absent,
    /// `Error::SizeMismatch` when the value is larger than `capacity`
    Get {
        db: DatabaseId,
        key: Key,
        capacity: u64,
    },

    /// Size of a stored value.
    /// Returns: `Output::Size`; `Error::UnknownKey` when absent
    Length { db: DatabaseId, key: Key },

    /// Whether a key is present.
    /// Returns: `Output::Bool`
    Exists { db: DatabaseId, key: Key },

    /// Remove a key. Removing an absent key succeeds.
    /// Returns: `Output::Unit`
    Erase { db: DatabaseId, key: Key },

    // ==================== Batch (5) ====================
    /// Store several pairs atomically.
    /// Returns: `Output::Unit`
    PutMulti {
        db: DatabaseId,
        entries: Vec<(Key, Value)>,
    },

    /// Fetch several values; `capacities[i]` bounds `keys[i]`.
    /// Returns: `Output::Values` (one `Option` per key, input order)
    GetMulti {
        db: DatabaseId,
        keys: Vec<Key>,
        capacities: Vec<u64>,
    },

    /// Sizes of several values.
    /// Returns: `Output::Sizes` (one `Option` per key, input order)
    LengthMulti { db: DatabaseId, keys: Vec<Key> },

    /// Presence of several keys.
    /// Returns: `Output::Bools`
    ExistsMulti { db: DatabaseId, keys: Vec<Key> },

    /// Remove several keys.
    /// Returns: `Output::Unit`
    EraseMulti { db: DatabaseId, keys: Vec<Key> },

    // ==================== Scan (2) ====================
    /// Keys after `start_key` sharing `prefix`, at most `max_keys`.
    ///
    /// Without capacities this is a sizing pass answered with
    /// `Output::SizeNegotiationRequired`. With capacities it is the data pass,
    /// answered with `Output::Keys`, or with `SizeNegotiationRequired` again if
    /// an entry no longer fits.
    ListKeys {
        db: DatabaseId,
        start_key: Key,
        prefix: Key,
        max_keys: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_capacities: Option<Capacities<u64>>,
    },

    /// Same as `ListKeys` but returning values as well.
    /// Data pass returns: `Output::KeyValues`
    ListKeyvals {
        db: DatabaseId,
        start_key: Key,
        prefix: Key,
        max_keys: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        capacities: Option<Capacities<(u64, u64)>>,
    },

    // ==================== Migration (2) ====================
    /// Move a database to another provider.
    /// Returns: `Output::DatabaseId` (id assigned by the destination)
    MigrateDatabase {
        db: DatabaseId,
        dest_address: Address,
        dest_provider: ProviderId,
        dest_root: String,
        remove_origin: bool,
    },

    /// Inbound half of a migration, sent provider to provider: create the
    /// database and load every entry in one step.
    /// Returns: `Output::DatabaseId`
    ReceiveDatabase {
        name: String,
        db_type: DatabaseType,
        root: String,
        entries: Vec<(Key, Value)>,
    },
}

impl Request {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Probe => "Probe",
            Request::Open { .. } => "Open",
            Request::CountDatabases => "CountDatabases",
            Request::ListDatabases { .. } => "ListDatabases",
            Request::Put { .. } => "Put",
            Request::Get { .. } => "Get",
            Request::Length { .. } => "Length",
            Request::Exists { .. } => "Exists",
            Request::Erase { .. } => "Erase",
            Request::PutMulti { .. } => "PutMulti",
            Request::GetMulti { .. } => "GetMulti",
            Request::LengthMulti { .. } => "LengthMulti",
            Request::ExistsMulti { .. } => "ExistsMulti",
            Request::EraseMulti { .. } => "EraseMulti",
            Request::ListKeys { .. } => "ListKeys",
            Request::ListKeyvals { .. } => "ListKeyvals",
            Request::MigrateDatabase { .. } => "MigrateDatabase",
            Request::ReceiveDatabase { .. } => "ReceiveDatabase",
        }
    }

    /// Target database, for requests scoped to one.
    pub fn database(&self) -> Option<DatabaseId> {
        match self {
            Request::Put { db, .. }
            | Request::Get { db, .. }
            | Request::Length { db, .. }
            | Request::Exists { db, .. }
            | Request::Erase { db, .. }
            | Request::PutMulti { db, .. }
            | Request::GetMulti { db, .. }
            | Request::LengthMulti { db, .. }
            | Request::ExistsMulti { db, .. }
            | Request::EraseMulti { db, .. }
            | Request::ListKeys { db, .. }
            | Request::ListKeyvals { db, .. }
            | Request::MigrateDatabase { db, .. } => Some(*db),
            Request::Probe
            | Request::Open { .. }
            | Request::CountDatabases
            | Request::ListDatabases { .. }
            | Request::ReceiveDatabase { .. } => None,
        }
    }

    /// Whether the request is one of the batched variants.
    pub fn is_batch(&self) -> bool {
        matches!(
            self,
            Request::PutMulti { .. }
                | Request::GetMulti { .. }
                | Request::LengthMulti { .. }
                | Request::ExistsMulti { .. }
                | Request::EraseMulti { .. }
        )
    }
}
