//! Table Cache Tests
//!
//! Tests verify:
//! - Read path never registers missing tables
//! - Write path creates and registers empty tables
//! - Existing and malformed backing files
//! - Exactly one Table per name under concurrent first access

use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use tablekv::cache::TableCache;
use tablekv::table::Entry;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_cache() -> (TempDir, TableCache) {
    let temp_dir = TempDir::new().unwrap();
    let cache = TableCache::new(temp_dir.path(), 8);
    (temp_dir, cache)
}

fn write_table_file(dir: &TempDir, name: &str, entries: &[Entry]) {
    let json = serde_json::to_vec(entries).unwrap();
    fs::write(dir.path().join(name), json).unwrap();
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_get_or_load_missing_table() {
    let (_temp, cache) = setup_temp_cache();

    assert!(cache.get_or_load("nope").is_none());
    assert!(!cache.contains("nope"));
    assert!(cache.is_empty());
}

#[test]
fn test_get_or_create_registers_empty_table() {
    let (_temp, cache) = setup_temp_cache();

    let table = cache.get_or_create("fresh");
    assert_eq!(table.name(), "fresh");
    assert!(table.is_empty());
    assert!(cache.contains("fresh"));

    let again = cache.get_or_load("fresh").unwrap();
    assert!(Arc::ptr_eq(&table, &again));
}

#[test]
fn test_get_or_load_reads_backing_file() {
    let (temp, cache) = setup_temp_cache();
    write_table_file(
        &temp,
        "users",
        &[Entry::new("name", "Alice"), Entry::new("age", "30")],
    );

    let table = cache.get_or_load("users").unwrap();
    assert_eq!(table.get("name"), Some("Alice".to_string()));
    assert_eq!(table.get("age"), Some("30".to_string()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_malformed_file_is_unknown_for_reads() {
    let (temp, cache) = setup_temp_cache();
    fs::write(temp.path().join("broken"), b"<element>not json</element>").unwrap();

    assert!(cache.get_or_load("broken").is_none());
    assert!(!cache.contains("broken"));
}

#[test]
fn test_malformed_file_replaced_on_write_path() {
    let (temp, cache) = setup_temp_cache();
    fs::write(temp.path().join("broken"), b"{{{").unwrap();

    let table = cache.get_or_create("broken");
    assert!(table.is_empty());
    assert!(cache.contains("broken"));
}

#[test]
fn test_table_names_sorted() {
    let (_temp, cache) = setup_temp_cache();
    cache.get_or_create("b");
    cache.get_or_create("c");
    cache.get_or_create("a");

    assert_eq!(cache.table_names(), vec!["a", "b", "c"]);
}

#[test]
fn test_single_shard_cache_works() {
    let temp_dir = TempDir::new().unwrap();
    let cache = TableCache::new(temp_dir.path(), 1);

    for i in 0..10 {
        cache.get_or_create(&format!("t{}", i));
    }
    assert_eq!(cache.len(), 10);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_first_create_yields_one_table() {
    let (_temp, cache) = setup_temp_cache();
    let cache = Arc::new(cache);
    let barrier = Arc::new(Barrier::new(32));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_create("unseen")
            })
        })
        .collect();

    let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for table in &tables[1..] {
        assert!(Arc::ptr_eq(&tables[0], table));
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_concurrent_first_load_yields_one_table() {
    let (temp, cache) = setup_temp_cache();
    write_table_file(&temp, "disk", &[Entry::new("k", "v")]);
    let cache = Arc::new(cache);
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Mix read-path and write-path first accesses
                if i % 2 == 0 {
                    cache.get_or_load("disk").unwrap()
                } else {
                    cache.get_or_create("disk")
                }
            })
        })
        .collect();

    let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for table in &tables[1..] {
        assert!(Arc::ptr_eq(&tables[0], table));
    }
    assert_eq!(tables[0].get("k"), Some("v".to_string()));
}

#[cfg(unix)]
#[test]
fn test_slow_load_does_not_block_cached_lookups() {
    use std::process::Command;
    use std::sync::mpsc;
    use std::time::Duration;

    let temp_dir = TempDir::new().unwrap();
    // One shard, so both names share the same stripe
    let cache = Arc::new(TableCache::new(temp_dir.path(), 1));
    cache.get_or_create("hot");

    // Reading a FIFO blocks until a writer shows up
    let fifo = temp_dir.path().join("slow");
    let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
    assert!(status.success());

    let loader = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || cache.get_or_load("slow"))
    };
    thread::sleep(Duration::from_millis(100));

    let (tx, rx) = mpsc::channel();
    {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            let _ = tx.send(cache.get_or_load("hot").is_some());
        });
    }
    let hot_found = rx.recv_timeout(Duration::from_secs(2));

    // Release the loader before asserting so the test never hangs
    fs::write(&fifo, b"[{\"key\":\"k\",\"value\":\"v\"}]").unwrap();
    let slow = loader.join().unwrap().unwrap();

    assert_eq!(hot_found, Ok(true));
    assert_eq!(slow.get("k"), Some("v".to_string()));
    assert!(Arc::ptr_eq(&slow, &cache.get_or_load("slow").unwrap()));
}

#[test]
fn test_read_miss_then_write_registers_one_table() {
    let (_temp, cache) = setup_temp_cache();
    let cache = Arc::new(cache);
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    cache.get_or_load("late")
                } else {
                    Some(cache.get_or_create("late"))
                }
            })
        })
        .collect();

    let tables: Vec<_> = handles
        .into_iter()
        .filter_map(|h| h.join().unwrap())
        .collect();
    for table in &tables[1..] {
        assert!(Arc::ptr_eq(&tables[0], table));
    }
    assert_eq!(cache.len(), 1);
}
