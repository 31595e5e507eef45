//! Internal result cache for the layout engine: a structural hash of the
//! operation name and its serialized inputs keys a type-erased value slot.
//! Purely an optimization: every facet operation is a pure function of its
//! inputs, so a hit cannot go stale. Reads take the shared lock, inserts
//! the exclusive lock; a soft cap bounds the map, evicting the oldest slot
//! on overflow.

use std::{
    any::Any,
    collections::HashMap,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use parking_lot::RwLock;
use serde::Serialize;

/// Soft cap on resident slots.
const CAPACITY: usize = 1000;

struct Slot {
    /// Full key material, compared on hit to rule out hash collisions.
    fingerprint: String,
    value: Arc<dyn Any + Send + Sync>,
    inserted_at: Instant,
    hits: AtomicU64,
}

/// Memo table shared by the engine's facets.
#[derive(Default)]
pub(crate) struct ResultCache {
    slots: RwLock<HashMap<u64, Slot>>,
}

fn structural_key(fingerprint: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    fingerprint.hash(&mut hasher);
    hasher.finish()
}

impl ResultCache {
    /// Look up the memoized result of `op` over `inputs`, computing and
    /// storing it on a miss. Inputs that fail to serialize skip the cache
    /// and compute directly.
    pub(crate) fn get_or_compute<T, I, E, F>(&self, op: &str, inputs: &I, compute: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        I: Serialize,
        F: FnOnce() -> Result<T, E>,
    {
        let Ok(serialized) = serde_json::to_string(inputs) else {
            return compute();
        };
        let fingerprint = format!("{op}:{serialized}");
        let key = structural_key(&fingerprint);

        {
            let slots = self.slots.read();
            if let Some(slot) = slots.get(&key) {
                if slot.fingerprint == fingerprint {
                    if let Some(value) = slot.value.downcast_ref::<T>() {
                        slot.hits.fetch_add(1, Ordering::Relaxed);
                        return Ok(value.clone());
                    }
                }
            }
        }

        let value = compute()?;
        let mut slots = self.slots.write();
        if slots.len() >= CAPACITY && !slots.contains_key(&key) {
            // Over the soft cap: evict the oldest slot.
            if let Some(oldest) = slots
                .iter()
                .min_by_key(|(_, slot)| slot.inserted_at)
                .map(|(key, _)| *key)
            {
                slots.remove(&oldest);
            }
        }
        slots.insert(
            key,
            Slot {
                fingerprint,
                value: Arc::new(value.clone()),
                inserted_at: Instant::now(),
                hits: AtomicU64::new(0),
            },
        );
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The second identical call is served from the cache.
    #[test]
    fn test_memoization() {
        let cache = ResultCache::default();
        let mut calls = 0;

        for _ in 0..2 {
            let result: Result<i64, ()> = cache.get_or_compute("double", &21, || {
                calls += 1;
                Ok(42)
            });
            assert_eq!(result, Ok(42));
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    /// Different inputs (and different operations) get separate slots.
    #[test]
    fn test_key_separation() {
        let cache = ResultCache::default();
        let _: Result<i64, ()> = cache.get_or_compute("op-a", &1, || Ok(1));
        let _: Result<i64, ()> = cache.get_or_compute("op-a", &2, || Ok(2));
        let _: Result<i64, ()> = cache.get_or_compute("op-b", &1, || Ok(3));
        assert_eq!(cache.len(), 3);

        let hit: Result<i64, ()> = cache.get_or_compute("op-a", &2, || unreachable!());
        assert_eq!(hit, Ok(2));
    }

    /// Errors are not cached; the next call recomputes.
    #[test]
    fn test_errors_not_cached() {
        let cache = ResultCache::default();
        let failed: Result<i64, &str> = cache.get_or_compute("op", &1, || Err("boom"));
        assert!(failed.is_err());

        let ok: Result<i64, &str> = cache.get_or_compute("op", &1, || Ok(5));
        assert_eq!(ok, Ok(5));
    }

    /// The soft cap holds under overflow.
    #[test]
    fn test_capacity_cap() {
        let cache = ResultCache::default();
        for i in 0..(CAPACITY + 50) {
            let _: Result<usize, ()> = cache.get_or_compute("fill", &i, || Ok(i));
        }
        assert!(cache.len() <= CAPACITY);
    }
}
