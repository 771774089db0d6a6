//! Atomic batch commit behavior (§4.F).

use caskdb_storage::{Engine, EngineOptions};

fn opts(dir: &tempfile::TempDir) -> EngineOptions {
    EngineOptions {
        dir_path: dir.path().to_path_buf(),
        segment_size: 1 << 20,
        sync_writes: false,
        bytes_per_sync: 0,
    }
}

#[test]
fn uncommitted_batch_writes_are_invisible() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    let batch = engine.new_batch();
    batch.put(b"a", b"1").unwrap();
    batch.put(b"b", b"2").unwrap();
    drop(batch);

    assert!(engine.get(b"a").is_err());
    assert!(engine.get(b"b").is_err());
}

#[test]
fn committed_batch_writes_become_visible_together() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    let batch = engine.new_batch();
    batch.put(b"a", b"1").unwrap();
    batch.put(b"b", b"2").unwrap();
    batch.commit().unwrap();

    assert_eq!(engine.get(b"a").unwrap(), b"1");
    assert_eq!(engine.get(b"b").unwrap(), b"2");
}

#[test]
fn batch_delete_does_not_require_an_existing_key() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();

    let batch = engine.new_batch();
    batch.delete(b"never-existed").unwrap();
    batch.commit().unwrap();

    assert!(engine.get(b"never-existed").is_err());
}

#[test]
fn batch_mixes_puts_and_deletes_against_existing_state() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(opts(&dir)).unwrap();
    engine.put(b"keep", b"v").unwrap();
    engine.put(b"remove", b"v").unwrap();

    let batch = engine.new_batch();
    batch.put(b"new", b"v2").unwrap();
    batch.delete(b"remove").unwrap();
    batch.commit().unwrap();

    assert_eq!(engine.get(b"keep").unwrap(), b"v");
    assert_eq!(engine.get(b"new").unwrap(), b"v2");
    assert!(engine.get(b"remove").is_err());
}

#[test]
fn batch_commit_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let engine = Engine::open(opts(&dir)).unwrap();
        let batch = engine.new_batch();
        batch.put(b"x", b"1").unwrap();
        batch.put(b"y", b"2").unwrap();
        batch.commit().unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open(opts(&dir)).unwrap();
    assert_eq!(engine.get(b"x").unwrap(), b"1");
    assert_eq!(engine.get(b"y").unwrap(), b"2");
}

#[test]
fn later_keys_reuse_tx_ids_after_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let engine = Engine::open(opts(&dir)).unwrap();
        for _ in 0..3 {
            let batch = engine.new_batch();
            batch.put(b"counter", b"tick").unwrap();
            batch.commit().unwrap();
        }
        engine.close().unwrap();
    }

    // A fresh batch after reopening must not collide with a tx_id already
    // used before the restart.
    let engine = Engine::open(opts(&dir)).unwrap();
    let batch = engine.new_batch();
    batch.put(b"after-restart", b"v").unwrap();
    batch.commit().unwrap();
    assert_eq!(engine.get(b"after-restart").unwrap(), b"v");
}
