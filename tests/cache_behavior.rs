//! Integration tests that exercise the cache's public contract across
//! operation mixes: TTL and LRU interplay, pattern invalidation over a
//! realistic key population, statistics accounting, and shutdown.

use std::{sync::Arc, thread, time::Duration};

use eisenkan_core::cache::{Cache, CacheConfig};

fn board_cache(max_size: usize) -> Cache<String> {
    Cache::new(CacheConfig {
        max_size,
        ..CacheConfig::default()
    })
}

/// TTL and LRU interact correctly: fresh entries can still be evicted by
/// capacity, stale entries vanish regardless of recency.
#[test]
fn ttl_and_lru_interplay() {
    let cache = board_cache(2);
    cache.set("stale", "v".to_string(), Some(Duration::from_millis(30)));
    cache.set("fresh", "v".to_string(), Some(Duration::from_secs(60)));

    // Touch the stale entry so it is the most recently used, then overflow.
    assert!(cache.contains("stale"));
    cache.set("extra", "v".to_string(), None);
    assert!(!cache.contains("fresh")); // LRU victim despite longer TTL

    thread::sleep(Duration::from_millis(50));
    assert!(!cache.contains("stale")); // expired despite recency
    assert!(cache.contains("extra"));
}

/// Pattern invalidation over task/board keys leaves unrelated keys alone.
#[test]
fn pattern_invalidation_population() {
    let cache = board_cache(64);
    for column in ["todo", "doing", "done"] {
        for i in 0..5 {
            cache.set(&format!("task:{column}:{i}"), column.to_string(), None);
        }
    }
    cache.set("board:config", "{}".to_string(), None);

    cache.invalidate_pattern("task:doing:*");
    for i in 0..5 {
        assert!(!cache.contains(&format!("task:doing:{i}")));
        assert!(cache.contains(&format!("task:todo:{i}")));
        assert!(cache.contains(&format!("task:done:{i}")));
    }
    assert!(cache.contains("board:config"));

    cache.invalidate_pattern("task:*");
    assert_eq!(cache.stats().size, 1);
    assert!(cache.contains("board:config"));
}

/// Statistics reconcile with the operations performed.
#[test]
fn statistics_accounting() {
    let cache = board_cache(3);
    for key in ["a", "b", "c", "d"] {
        cache.set(key, key.to_string(), None);
    }
    // "a" was evicted by the insert of "d".
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some("b".to_string()));
    assert_eq!(cache.get("c"), Some("c".to_string()));

    let stats = cache.stats();
    assert_eq!(stats.size, 3);
    assert_eq!(stats.max_size, 3);
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_ratio - 2.0 / 3.0).abs() < 1e-9);
    assert!(stats.approx_memory_bytes > 0);
}

/// Readers on other threads observe writes, and the bound holds throughout.
#[test]
fn cross_thread_visibility() {
    let cache = Arc::new(board_cache(32));
    cache.set("seed", "0".to_string(), None);

    // Stay under capacity so "seed" is never an eviction victim.
    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 0..20 {
                cache.set(&format!("k{i}"), i.to_string(), None);
            }
        })
    };
    let reader = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(cache.get("seed"), Some("0".to_string()));
                let stats = cache.stats();
                assert!(stats.size <= stats.max_size);
            }
        })
    };
    writer.join().expect("writer panicked");
    reader.join().expect("reader panicked");
}

/// Shutdown stops the janitor; the cache stays readable and a second
/// shutdown is a no-op.
#[test]
fn shutdown_semantics() {
    let cache: Cache<i32> = Cache::new(CacheConfig {
        max_size: 8,
        default_ttl: Duration::from_millis(20),
        cleanup_interval: Duration::from_millis(10),
    });
    cache.set("k", 1, Some(Duration::from_secs(60)));
    cache.shutdown();
    cache.shutdown();

    // No background sweeps anymore, but direct operations still work.
    assert_eq!(cache.get("k"), Some(1));
    cache.set("later", 2, Some(Duration::from_millis(5)));
    thread::sleep(Duration::from_millis(30));
    cache.cleanup();
    assert!(!cache.contains("later"));
    assert!(cache.contains("k"));
}
