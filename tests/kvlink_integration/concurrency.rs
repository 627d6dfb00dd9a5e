//! Several clients on one database.

use std::sync::{Arc, Barrier};
use std::thread;

use kvlink::{Client, DatabaseType, Error, Instance, ScanCursor};
use kvlink::Transport;

use crate::{temp_cluster, SELECTOR};

const WRITERS: usize = 4;
const KEYS_PER_WRITER: usize = 50;

#[test]
fn disjoint_writers_all_land() {
    let (_dir, c) = temp_cluster();
    let db = c.database("shared", DatabaseType::Tree);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let workers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let fabric = c.fabric.clone();
            let address = c.server.address().clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let client = Client::init(Instance::new(&fabric).unwrap()).unwrap();
                let handle = client.provider_handle_create(&address, SELECTOR).unwrap();
                barrier.wait();
                for i in 0..KEYS_PER_WRITER {
                    let key = format!("w{w}:{i:03}");
                    handle.put(db, key.as_bytes(), key.as_bytes()).unwrap();
                }
                handle.release().unwrap();
                client.finalize();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let keys: Vec<Vec<u8>> = c
        .handle
        .scan_keys(db, b"w", 64)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
        .concat();
    assert_eq!(keys.len(), WRITERS * KEYS_PER_WRITER);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    let values = c.handle.get_multi(db, &keys).unwrap();
    for (k, v) in keys.iter().zip(values) {
        assert_eq!(v.as_deref(), Some(k.as_slice()));
    }
}

#[test]
fn shared_handle_across_threads() {
    let (_dir, c) = temp_cluster();
    let db = c.database("counter", DatabaseType::Map);

    let workers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let handle = c.handle.clone();
            handle.ref_incr().unwrap();
            thread::spawn(move || {
                handle.put(db, format!("slot{w}").as_bytes(), &[w as u8]).unwrap();
                handle.release().unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(c.handle.ref_count(), 1);
    assert_eq!(
        c.handle
            .list_keys(db, &ScanCursor::new(b"slot", 10))
            .unwrap()
            .len(),
        WRITERS
    );
}

#[test]
fn readers_see_whole_values_while_a_writer_resizes() {
    let (_dir, c) = temp_cluster();
    let db = c.database("resized", DatabaseType::Map);
    c.handle.put(db, b"k", b"a").unwrap();

    let writer = {
        let handle = c.handle.clone();
        thread::spawn(move || {
            for n in 1..200usize {
                let value = vec![b'a'; n % 37 + 1];
                handle.put(db, b"k", &value).unwrap();
            }
        })
    };

    for _ in 0..200 {
        match c.handle.get(db, b"k") {
            Ok(Some(v)) => assert!(!v.is_empty() && v.iter().all(|b| *b == b'a')),
            Err(Error::SizeChanged { .. }) => {}
            other => panic!("unexpected read result: {other:?}"),
        }
    }
    writer.join().unwrap();
}
