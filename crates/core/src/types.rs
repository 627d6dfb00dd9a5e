//! Identifiers shared by clients, providers and the transport.
//!
//! - [`Address`]: where a transport instance can be reached
//! - [`ProviderId`]: 8-bit selector of a provider inside an instance
//! - [`DatabaseId`]: provider-scoped 64-bit database identifier
//! - [`DatabaseType`]: backend variant chosen when a database is created

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Transport address of an instance (e.g. `local://node-1`).
///
/// Addresses are opaque to the client: they are produced by the transport's
/// `lookup` and handed back to it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Scheme used by the in-process fabric.
    pub const LOCAL_SCHEME: &'static str = "local://";

    /// Wrap an address string.
    pub fn new(addr: impl Into<String>) -> Self {
        Address(addr.into())
    }

    /// Build a `local://` address for an instance name.
    pub fn local(name: &str) -> Self {
        Address(format!("{}{}", Self::LOCAL_SCHEME, name))
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::new(s)
    }
}

/// Provider selector: distinguishes providers registered on one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub u8);

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ProviderId {
    fn from(id: u8) -> Self {
        ProviderId(id)
    }
}

/// Identifier of a database inside a provider.
///
/// `DatabaseId::INVALID` (zero) is never assigned; it is what `open` returns
/// for a name the provider does not host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatabaseId(pub u64);

impl DatabaseId {
    /// Sentinel for "no such database".
    pub const INVALID: DatabaseId = DatabaseId(0);

    /// Whether this id refers to a database (is not the sentinel).
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend variant selected when a database is created.
///
/// The variant only matters at creation; afterwards every database answers
/// the same request set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseType {
    /// In-memory ordered map
    Map,
    /// In-memory tree index
    Tree,
    /// Append-only log file with an in-memory index
    Log,
    /// B-tree persisted as a snapshot file
    EmbeddedBtree,
}

impl DatabaseType {
    /// All variants, in declaration order.
    pub const ALL: [DatabaseType; 4] = [
        DatabaseType::Map,
        DatabaseType::Tree,
        DatabaseType::Log,
        DatabaseType::EmbeddedBtree,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Map => "map",
            DatabaseType::Tree => "tree",
            DatabaseType::Log => "log",
            DatabaseType::EmbeddedBtree => "embedded_btree",
        }
    }

    /// Whether the backend keeps data on disk under the database path.
    pub fn is_persistent(&self) -> bool {
        matches!(self, DatabaseType::Log | DatabaseType::EmbeddedBtree)
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "map" => Ok(DatabaseType::Map),
            "tree" => Ok(DatabaseType::Tree),
            "log" => Ok(DatabaseType::Log),
            "embedded_btree" | "btree" => Ok(DatabaseType::EmbeddedBtree),
            other => Err(Error::InvalidArgument {
                reason: format!("unknown database type '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_database_id() {
        assert!(!DatabaseId::INVALID.is_valid());
        assert!(DatabaseId(7).is_valid());
    }

    #[test]
    fn test_database_type_names() {
        for ty in DatabaseType::ALL {
            assert_eq!(ty.as_str().parse::<DatabaseType>().unwrap(), ty);
        }
        assert_eq!("btree".parse::<DatabaseType>().unwrap(), DatabaseType::EmbeddedBtree);
        assert!("leveldb".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_local_address() {
        let addr = Address::local("node-1");
        assert_eq!(addr.as_str(), "local://node-1");
        assert_eq!(addr.to_string(), "local://node-1");
    }
}
