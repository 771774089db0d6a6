//! End-to-end behavior of the user-facing cursor (§4.H), layered on top of
//! a live engine rather than a bare index snapshot.

use caskdb_storage::{Engine, EngineOptions, IteratorOptions};

fn opts(dir: &tempfile::TempDir) -> EngineOptions {
    EngineOptions {
        dir_path: dir.path().to_path_buf(),
        segment_size: 4096,
        sync_writes: false,
        bytes_per_sync: 0,
    }
}

fn populate(engine: &Engine) {
    for (k, v) in [("apple", "1"), ("banana", "2"), ("cherry", "3")] {
        engine.put(k.as_bytes(), v.as_bytes()).unwrap();
    }
}

#[test]
fn forward_iteration_resolves_values_in_ascending_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();
    populate(&engine);

    let mut it = engine.iter(IteratorOptions::default());
    let mut seen = Vec::new();
    while it.has_next() {
        let key = it.key().unwrap().to_vec();
        let value = it.value().unwrap().unwrap();
        seen.push((key, value));
        it.next();
    }
    assert_eq!(
        seen,
        vec![
            (b"apple".to_vec(), b"1".to_vec()),
            (b"banana".to_vec(), b"2".to_vec()),
            (b"cherry".to_vec(), b"3".to_vec()),
        ]
    );
}

#[test]
fn reverse_iteration_visits_descending_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();
    populate(&engine);

    let opts = IteratorOptions {
        reverse: true,
        prefix: Vec::new(),
    };
    let mut it = engine.iter(opts);
    let mut seen = Vec::new();
    while it.has_next() {
        seen.push(it.key().unwrap().to_vec());
        it.next();
    }
    assert_eq!(seen, vec![b"cherry".to_vec(), b"banana".to_vec(), b"apple".to_vec()]);
}

#[test]
fn prefix_restricts_iteration_to_matching_keys() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();
    engine.put(b"user:1", b"a").unwrap();
    engine.put(b"user:2", b"b").unwrap();
    engine.put(b"order:1", b"c").unwrap();

    let opts = IteratorOptions {
        reverse: false,
        prefix: b"user:".to_vec(),
    };
    let mut it = engine.iter(opts);
    let mut seen = Vec::new();
    while it.has_next() {
        seen.push(it.key().unwrap().to_vec());
        it.next();
    }
    assert_eq!(seen, vec![b"user:1".to_vec(), b"user:2".to_vec()]);
}

#[test]
fn value_resolves_across_segment_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let small = EngineOptions {
        dir_path: dir.path().to_path_buf(),
        segment_size: 256,
        sync_writes: false,
        bytes_per_sync: 0,
    };
    let engine = Engine::open(small).unwrap();
    for i in 0..40u32 {
        let key = format!("k{i:03}");
        let value = "v".repeat(16);
        engine.put(key.as_bytes(), value.as_bytes()).unwrap();
    }

    let mut it = engine.iter(IteratorOptions::default());
    let mut count = 0;
    while it.has_next() {
        let value = it.value().unwrap().unwrap();
        assert_eq!(value, "v".repeat(16).as_bytes());
        count += 1;
        it.next();
    }
    assert_eq!(count, 40);
}

#[test]
fn iterator_is_a_snapshot_unaffected_by_later_writes() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();
    populate(&engine);

    let it = engine.iter(IteratorOptions::default());
    engine.put(b"date", b"4").unwrap();
    engine.delete(b"apple").unwrap();

    assert_eq!(it.len(), 3);
}

#[test]
fn value_past_the_end_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();
    populate(&engine);

    let mut it = engine.iter(IteratorOptions::default());
    while it.has_next() {
        it.next();
    }
    assert_eq!(it.value().unwrap(), None);
}
