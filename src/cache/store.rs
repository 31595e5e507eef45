//! Thread-safe keyed store with TTL expiration, LRU eviction, glob pattern
//! invalidation, and contention-free statistics.
//!
//! One writer-preferring reader/writer lock protects the key map and the
//! recency list together, so the two always agree on the key set. The
//! hit/miss/eviction counters are atomics, letting `stats()` read them
//! without blocking mutators beyond a brief snapshot of the sizes. A
//! background janitor thread sweeps expired entries; its lifetime is bounded
//! by the cache's own (`shutdown` signals and joins, and `Drop` does the
//! same).

use std::{
    collections::HashMap,
    mem,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
        mpsc,
    },
    thread,
    time::{Duration, Instant},
};

use parking_lot::{Mutex, RwLock};

use crate::cache::{config::CacheConfig, recency::RecencyList};

/// Point-in-time view of cache statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, 0 when nothing was looked up yet.
    pub hit_ratio: f64,
    pub evictions: u64,
    pub approx_memory_bytes: usize,
    pub last_cleanup: Option<Instant>,
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
    #[allow(dead_code)]
    created_at: Instant,
    last_accessed: Instant,
    /// Handle of the recency-list node carrying this entry's key.
    node: usize,
}

struct State<V> {
    map: HashMap<String, Entry<V>, ahash::RandomState>,
    recency: RecencyList,
    max_size: usize,
    default_ttl: Duration,
    approx_bytes: usize,
    last_cleanup: Option<Instant>,
}

struct Shared<V> {
    state: RwLock<State<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

struct Janitor {
    stop_tx: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Thread-safe TTL/LRU cache. Values are opaque; `get` clones them out.
/// Construct one per logical namespace.
pub struct Cache<V> {
    shared: Arc<Shared<V>>,
    janitor: Mutex<Option<Janitor>>,
}

/// Rough resident footprint of one entry: the key is held twice (map and
/// recency node) next to the entry struct itself.
fn entry_footprint<V>(key: &str) -> usize {
    2 * (key.len() + mem::size_of::<String>()) + mem::size_of::<Entry<V>>()
}

pub(crate) fn compute_hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

impl<V> State<V> {
    fn remove_entry(&mut self, key: &str) -> Option<Entry<V>> {
        let entry = self.map.remove(key)?;
        self.recency.remove(entry.node);
        self.approx_bytes = self
            .approx_bytes
            .saturating_sub(entry_footprint::<V>(key));
        Some(entry)
    }

    /// Evict from the back of the recency list until the bound holds.
    fn evict_overflow(&mut self, evictions: &AtomicU64) {
        while self.map.len() > self.max_size {
            let Some(key) = self.recency.pop_back() else {
                break;
            };
            // The node was already popped; only the byte accounting remains.
            if self.map.remove(&key).is_some() {
                self.approx_bytes = self
                    .approx_bytes
                    .saturating_sub(entry_footprint::<V>(&key));
            }
            evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop every entry whose expiration has passed.
    fn sweep_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .map
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove_entry(&key);
        }
        self.last_cleanup = Some(now);
    }
}

impl<V: Clone + Send + Sync + 'static> Cache<V> {
    /// Build a cache and start its cleanup task. Invalid config fields fall
    /// back to defaults; construction itself never fails.
    pub fn new(config: CacheConfig) -> Cache<V> {
        let config = config.normalized();
        let shared = Arc::new(Shared {
            state: RwLock::new(State {
                map: HashMap::default(),
                recency: RecencyList::new(),
                max_size: config.max_size,
                default_ttl: config.default_ttl,
                approx_bytes: 0,
                last_cleanup: None,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        });

        let janitor = spawn_janitor(Arc::clone(&shared), config.cleanup_interval);
        Cache {
            shared,
            janitor: Mutex::new(janitor),
        }
    }

    /// Insert or refresh `key`. An empty key is a no-op; a missing or zero
    /// TTL uses the default. Refreshing moves the key to the front of the
    /// recency list.
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        if key.is_empty() {
            return;
        }
        let now = Instant::now();
        let mut state = self.shared.state.write();
        let ttl = match ttl {
            Some(t) if !t.is_zero() => t,
            _ => state.default_ttl,
        };
        let expires_at = now + ttl;

        let State { map, recency, .. } = &mut *state;
        if let Some(entry) = map.get_mut(key) {
            entry.value = value;
            entry.expires_at = expires_at;
            entry.last_accessed = now;
            recency.move_to_front(entry.node);
            return;
        }

        let node = recency.push_front(key.to_string());
        map.insert(
            key.to_string(),
            Entry {
                value,
                expires_at,
                created_at: now,
                last_accessed: now,
                node,
            },
        );
        state.approx_bytes += entry_footprint::<V>(key);
        state.evict_overflow(&self.shared.evictions);
    }

    /// Look up `key`, refreshing its recency on a hit. Empty keys and
    /// expired entries count as misses; expired entries are evicted lazily.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lookup(key)
    }

    /// [`Cache::get`] without returning the value. Still refreshes recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn lookup(&self, key: &str) -> Option<V> {
        if key.is_empty() {
            self.shared.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let now = Instant::now();
        let mut state = self.shared.state.write();

        let expired = match state.map.get(key) {
            Some(entry) => entry.expires_at <= now,
            None => {
                drop(state);
                self.shared.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        if expired {
            state.remove_entry(key);
            drop(state);
            self.shared.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let State { map, recency, .. } = &mut *state;
        let entry = map.get_mut(key)?;
        entry.last_accessed = now;
        recency.move_to_front(entry.node);
        let value = entry.value.clone();
        drop(state);
        self.shared.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    /// Remove `key` if present. Absent and empty keys are no-ops.
    pub fn invalidate(&self, key: &str) {
        if key.is_empty() {
            return;
        }
        self.shared.state.write().remove_entry(key);
    }

    /// Remove every key matching a shell-style glob. Empty or invalid
    /// patterns are no-ops. Matches are collected before removal so map
    /// iteration and mutation do not interleave.
    pub fn invalidate_pattern(&self, pattern: &str) {
        if pattern.is_empty() {
            return;
        }
        let Ok(compiled) = glob::Pattern::new(pattern) else {
            tracing::warn!("cache: ignoring invalid invalidation pattern `{pattern}`");
            return;
        };

        let mut state = self.shared.state.write();
        let matching: Vec<String> = state
            .map
            .keys()
            .filter(|key| compiled.matches(key))
            .cloned()
            .collect();
        for key in matching {
            state.remove_entry(&key);
        }
    }

    /// Drop every entry. Statistics are preserved.
    pub fn clear(&self) {
        let mut state = self.shared.state.write();
        state.map.clear();
        state.recency.clear();
        state.approx_bytes = 0;
    }

    /// Remove every expired entry now, without waiting for the janitor.
    pub fn cleanup(&self) {
        self.shared.state.write().sweep_expired(Instant::now());
    }

    /// Update the size bound, evicting immediately if the cache overflows.
    /// Zero is ignored.
    pub fn set_max_size(&self, max_size: usize) {
        if max_size == 0 {
            return;
        }
        let mut state = self.shared.state.write();
        state.max_size = max_size;
        state.evict_overflow(&self.shared.evictions);
    }

    /// Update the default TTL for future `set` calls. Zero is ignored.
    pub fn set_default_ttl(&self, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.shared.state.write().default_ttl = ttl;
    }

    /// Statistics snapshot: counters are read lock-free, sizes under a brief
    /// shared lock.
    pub fn stats(&self) -> CacheStats {
        let hits = self.shared.hits.load(Ordering::Relaxed);
        let misses = self.shared.misses.load(Ordering::Relaxed);
        let evictions = self.shared.evictions.load(Ordering::Relaxed);

        let state = self.shared.state.read();
        CacheStats {
            size: state.map.len(),
            max_size: state.max_size,
            hits,
            misses,
            hit_ratio: compute_hit_ratio(hits, misses),
            evictions,
            approx_memory_bytes: state.approx_bytes,
            last_cleanup: state.last_cleanup,
        }
    }

    /// Stop the cleanup task and wait for it to exit. Idempotent.
    pub fn shutdown(&self) {
        let janitor = self.janitor.lock().take();
        if let Some(janitor) = janitor {
            drop(janitor.stop_tx);
            if janitor.handle.join().is_err() {
                tracing::warn!("cache: cleanup task panicked during shutdown");
            }
        }
    }

    /// Key sets of the map and the recency list, for invariant checks.
    #[cfg(test)]
    pub(crate) fn key_sets(&self) -> (Vec<String>, Vec<String>) {
        let state = self.shared.state.read();
        let mut map_keys: Vec<String> = state.map.keys().cloned().collect();
        map_keys.sort();
        let mut list_keys: Vec<String> =
            state.recency.keys().iter().map(|k| k.to_string()).collect();
        list_keys.sort();
        (map_keys, list_keys)
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        let janitor = self.janitor.lock().take();
        if let Some(janitor) = janitor {
            drop(janitor.stop_tx);
            let _ = janitor.handle.join();
        }
    }
}

fn spawn_janitor<V: Send + Sync + 'static>(
    shared: Arc<Shared<V>>,
    interval: Duration,
) -> Option<Janitor> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let spawned = thread::Builder::new()
        .name("eisenkan-cache-cleanup".to_string())
        .spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        shared.state.write().sweep_expired(Instant::now());
                    }
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

    match spawned {
        Ok(handle) => Some(Janitor { stop_tx, handle }),
        Err(e) => {
            tracing::warn!("cache: failed to spawn cleanup task: {e}");
            None
        }
    }
}
