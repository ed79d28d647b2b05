//! Persistence Tests
//!
//! Tests verify:
//! - Backing file round trip through load_table
//! - Full rewrite (not append) on every snapshot
//! - Arrival-order writes for one table
//! - Write failures are isolated to their table
//! - Shutdown drains the queue

use std::fs;

use tablekv::persist::{load_table, table_path, write_snapshot, Persister};
use tablekv::table::{Entry, Snapshot};
use tempfile::TempDir;

fn snapshot(table: &str, entries: &[(&str, &str)]) -> Snapshot {
    Snapshot {
        table: table.to_string(),
        entries: entries.iter().map(|(k, v)| Entry::new(*k, *v)).collect(),
    }
}

// =============================================================================
// File Codec Tests
// =============================================================================

#[test]
fn test_load_missing_file_is_none() {
    let temp = TempDir::new().unwrap();
    assert!(load_table(temp.path(), "missing").unwrap().is_none());
}

#[test]
fn test_write_then_load() {
    let temp = TempDir::new().unwrap();
    let snap = snapshot("users", &[("name", "Alice"), ("city", "New York")]);

    write_snapshot(temp.path(), &snap, true).unwrap();

    let records = load_table(temp.path(), "users").unwrap().unwrap();
    assert_eq!(records.entries(), snap.entries.as_slice());
}

#[test]
fn test_write_truncates_previous_contents() {
    let temp = TempDir::new().unwrap();
    write_snapshot(temp.path(), &snapshot("t", &[("a", "1"), ("b", "2"), ("c", "3")]), false)
        .unwrap();
    write_snapshot(temp.path(), &snapshot("t", &[("a", "1")]), false).unwrap();

    let records = load_table(temp.path(), "t").unwrap().unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_file_is_json_array_of_pairs() {
    let temp = TempDir::new().unwrap();
    write_snapshot(temp.path(), &snapshot("t", &[("k", "v")]), false).unwrap();

    let text = fs::read_to_string(table_path(temp.path(), "t")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, serde_json::json!([{"key": "k", "value": "v"}]));
}

#[test]
fn test_malformed_file_is_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("bad"), b"[{\"key\": 1}]").unwrap();

    assert!(load_table(temp.path(), "bad").is_err());
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_persister_writes_in_arrival_order() {
    let temp = TempDir::new().unwrap();
    let persister = Persister::start(temp.path(), 4, false).unwrap();

    for i in 0..50 {
        let value = i.to_string();
        persister.submit(snapshot("counter", &[("n", value.as_str())]));
    }
    persister.sync().unwrap();

    let records = load_table(temp.path(), "counter").unwrap().unwrap();
    assert_eq!(records.lookup("n"), Some("49"));
    assert_eq!(persister.written(), 50);
    assert_eq!(persister.failed(), 0);
}

#[test]
fn test_failed_write_does_not_block_other_tables() {
    let temp = TempDir::new().unwrap();
    // A directory where the table file should be makes File::create fail
    fs::create_dir(temp.path().join("blocked")).unwrap();
    let persister = Persister::start(temp.path(), 8, false).unwrap();

    persister.submit(snapshot("blocked", &[("k", "v")]));
    persister.submit(snapshot("open", &[("k", "v")]));
    persister.sync().unwrap();

    assert_eq!(persister.failed(), 1);
    assert_eq!(persister.written(), 1);
    let records = load_table(temp.path(), "open").unwrap().unwrap();
    assert_eq!(records.lookup("k"), Some("v"));
}

#[test]
fn test_failed_table_converges_on_next_write() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("flaky");
    fs::create_dir(&blocker).unwrap();
    let persister = Persister::start(temp.path(), 8, false).unwrap();

    persister.submit(snapshot("flaky", &[("k", "1")]));
    persister.sync().unwrap();
    assert_eq!(persister.failed(), 1);

    fs::remove_dir(&blocker).unwrap();
    persister.submit(snapshot("flaky", &[("k", "2")]));
    persister.sync().unwrap();

    let records = load_table(temp.path(), "flaky").unwrap().unwrap();
    assert_eq!(records.lookup("k"), Some("2"));
}

#[test]
fn test_shutdown_drains_queue() {
    let temp = TempDir::new().unwrap();
    let persister = Persister::start(temp.path(), 1024, false).unwrap();

    for i in 0..100 {
        persister.submit(snapshot(&format!("t{}", i), &[("k", "v")]));
    }
    persister.shutdown().unwrap();

    for i in 0..100 {
        assert!(table_path(temp.path(), &format!("t{}", i)).exists());
    }
}

#[test]
fn test_small_queue_applies_backpressure_without_loss() {
    let temp = TempDir::new().unwrap();
    let persister = Persister::start(temp.path(), 1, false).unwrap();

    for i in 0..200 {
        let value = i.to_string();
        persister.submit(snapshot("bp", &[("n", value.as_str())]));
    }
    persister.sync().unwrap();

    assert_eq!(persister.written(), 200);
}
