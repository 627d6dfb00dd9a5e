//! Request handlers organized by category.
//!
//! | Module | Requests |
//! |--------|----------|
//! | `catalog` | Open, CountDatabases, ListDatabases |
//! | `kv` | Put, Get, Length, Exists, Erase |
//! | `batch` | PutMulti, GetMulti, LengthMulti, ExistsMulti, EraseMulti |
//! | `scan` | ListKeys, ListKeyvals |
//! | `migrate` | MigrateDatabase, ReceiveDatabase |

pub(crate) mod batch;
pub(crate) mod catalog;
pub(crate) mod kv;
pub(crate) mod migrate;
pub(crate) mod scan;

/// Clamp a wire count to `usize`.
pub(crate) fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
