//! Operations on a [`ProviderHandle`](crate::ProviderHandle), one module per
//! family.
//!
//! | Module | Operations |
//! |--------|------------|
//! | `catalog` | open, list_databases, database |
//! | `kv` | put, get, get_with_hint, length, exists, erase |
//! | `batch` | put_multi, get_multi, get_multi_with_hint, length_multi, exists_multi, erase_multi |
//! | `scan` | list_keys, list_keyvals, scan_keys, scan_keyvals |
//! | `migrate` | migrate_database |
//!
//! Reads whose size is unknown run in two passes: a sizing pass that learns
//! exact sizes, then a data pass with capacities set to those sizes. The data
//! pass is authoritative. An entry that grew in between fails the call with
//! `SizeChanged`; it is never truncated.

mod batch;
mod catalog;
mod kv;
mod migrate;
mod scan;

pub use scan::{KeyPages, KeyValuePages, ScanCursor};
