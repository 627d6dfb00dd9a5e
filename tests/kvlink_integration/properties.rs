//! Key/value, batch and scan guarantees, checked against every backend.

use std::collections::BTreeMap;

use kvlink::{DatabaseType, ScanCursor};
use proptest::prelude::*;

use crate::{key, temp_cluster};

#[test]
fn round_trip_absent_and_idempotent_erase_on_every_backend() {
    for db_type in DatabaseType::ALL {
        let (_dir, c) = temp_cluster();
        let db = c.database("props", db_type);
        let h = &c.handle;

        assert_eq!(h.get(db, b"never").unwrap(), None, "{db_type}");
        h.put(db, b"k", b"value").unwrap();
        assert_eq!(h.get(db, b"k").unwrap(), Some(b"value".to_vec()), "{db_type}");
        assert!(h.exists(db, b"k").unwrap());

        h.erase(db, b"k").unwrap();
        h.erase(db, b"k").unwrap();
        assert_eq!(h.get(db, b"k").unwrap(), None, "{db_type}");
        assert!(!h.exists(db, b"k").unwrap());
    }
}

#[test]
fn length_of_missing_and_present_keys() {
    let (_dir, c) = temp_cluster();
    let db = c.database("len", DatabaseType::Map);
    assert_eq!(c.handle.length(db, b"missing").unwrap(), None);
    c.handle.put(db, b"a", b"xyz").unwrap();
    assert_eq!(c.handle.length(db, b"a").unwrap(), Some(3));
}

#[test]
fn prefix_scan_scenario_on_every_backend() {
    for db_type in DatabaseType::ALL {
        let (_dir, c) = temp_cluster();
        let db = c.database("scan", db_type);
        for k in ["a", "ab", "b"] {
            c.handle.put(db, k.as_bytes(), b"v").unwrap();
        }

        let all = c.handle.list_keys(db, &ScanCursor::new(b"a", 10)).unwrap();
        assert_eq!(all, vec![key("a"), key("ab")], "{db_type}");

        let first = c.handle.list_keys(db, &ScanCursor::new(b"a", 1)).unwrap();
        assert_eq!(first, vec![key("a")]);
        let rest = c
            .handle
            .list_keys(db, &ScanCursor::new(b"a", 1).start_after(b"a"))
            .unwrap();
        assert_eq!(rest, vec![key("ab")]);
    }
}

#[test]
fn oversized_value_rejected_by_limits() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = kvlink::ProviderConfig::with_root(dir.path());
    config.limits.max_value_bytes = 8;
    let c = crate::Cluster::with_config(config);
    let db = c.database("small", DatabaseType::Map);

    c.handle.put(db, b"fits", b"12345678").unwrap();
    match c.handle.put(db, b"big", b"123456789") {
        Err(kvlink::Error::Provider { status, .. }) => {
            assert_eq!(status, kvlink::StatusCode::Constraint)
        }
        other => panic!("expected a constraint failure, got {other:?}"),
    }
    assert_eq!(c.handle.get(db, b"big").unwrap(), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn store_matches_model(
        ops in prop::collection::vec(
            (prop::collection::vec(0u8..6, 1..4), prop::option::of(prop::collection::vec(any::<u8>(), 0..32))),
            1..40,
        ),
    ) {
        let (_dir, c) = temp_cluster();
        let db = c.database("model", DatabaseType::Tree);
        let mut model = BTreeMap::new();
        for (k, v) in &ops {
            match v {
                Some(v) => {
                    c.handle.put(db, k, v).unwrap();
                    model.insert(k.clone(), v.clone());
                }
                None => {
                    c.handle.erase(db, k).unwrap();
                    model.remove(k);
                }
            }
        }

        let probes: Vec<Vec<u8>> = ops.iter().map(|(k, _)| k.clone()).collect();
        let batch = c.handle.get_multi(db, &probes).unwrap();
        for (k, got) in probes.iter().zip(&batch) {
            prop_assert_eq!(got, &model.get(k).cloned());
            prop_assert_eq!(c.handle.exists(db, k).unwrap(), model.contains_key(k));
        }

        let scanned: Vec<(Vec<u8>, Vec<u8>)> = c
            .handle
            .scan_keyvals(db, b"", 3)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .concat();
        let expected: Vec<(Vec<u8>, Vec<u8>)> = model.into_iter().collect();
        prop_assert_eq!(scanned, expected);
    }
}
