//! Point read/write/delete behavior and list/fold over a single open
//! engine (no restart involved).

use caskdb_storage::{CaskError, Engine, EngineOptions};

fn opts(dir: &tempfile::TempDir) -> EngineOptions {
    EngineOptions {
        dir_path: dir.path().to_path_buf(),
        segment_size: 4096,
        sync_writes: false,
        bytes_per_sync: 0,
    }
}

#[test]
fn put_then_get_returns_the_value() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    engine.put(b"hello", b"world").unwrap();
    assert_eq!(engine.get(b"hello").unwrap(), b"world");
}

#[test]
fn put_overwrites_the_previous_value() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    engine.put(b"k", b"v1").unwrap();
    engine.put(b"k", b"v2").unwrap();
    assert_eq!(engine.get(b"k").unwrap(), b"v2");
}

#[test]
fn get_on_missing_key_is_key_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    assert!(matches!(engine.get(b"nope"), Err(CaskError::KeyNotFound)));
}

#[test]
fn delete_then_get_is_key_deleted_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    engine.put(b"k", b"v").unwrap();
    engine.delete(b"k").unwrap();
    assert!(matches!(engine.get(b"k"), Err(CaskError::KeyNotFound)));
}

#[test]
fn delete_on_missing_key_errors() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    assert!(matches!(engine.delete(b"nope"), Err(CaskError::KeyNotFound)));
}

#[test]
fn empty_key_is_rejected_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    assert!(matches!(engine.put(b"", b"v"), Err(CaskError::EmptyKey)));
    assert!(matches!(engine.get(b""), Err(CaskError::EmptyKey)));
    assert!(matches!(engine.delete(b""), Err(CaskError::EmptyKey)));
}

#[test]
fn list_keys_is_sorted_and_excludes_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    engine.put(b"banana", b"1").unwrap();
    engine.put(b"apple", b"2").unwrap();
    engine.put(b"cherry", b"3").unwrap();
    engine.delete(b"banana").unwrap();

    assert_eq!(
        engine.list_keys().unwrap(),
        vec![b"apple".to_vec(), b"cherry".to_vec()]
    );
}

#[test]
fn fold_visits_every_live_pair_and_can_stop_early() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    for (k, v) in [("a", "1"), ("b", "2"), ("c", "3")] {
        engine.put(k.as_bytes(), v.as_bytes()).unwrap();
    }

    let mut seen = Vec::new();
    engine
        .fold(|k, v| {
            seen.push((k.to_vec(), v.to_vec()));
            true
        })
        .unwrap();
    assert_eq!(seen.len(), 3);

    let mut count = 0;
    engine
        .fold(|_, _| {
            count += 1;
            count < 2
        })
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn writes_past_the_segment_size_rotate_to_a_new_segment() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    for i in 0..200u32 {
        let key = format!("key-{i:04}");
        let value = "x".repeat(64);
        engine.put(key.as_bytes(), value.as_bytes()).unwrap();
    }

    let data_files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("data"))
        .collect();
    assert!(data_files.len() > 1, "expected rotation to produce multiple segments");

    for i in 0..200u32 {
        let key = format!("key-{i:04}");
        assert_eq!(engine.get(key.as_bytes()).unwrap(), "x".repeat(64).as_bytes());
    }
}
