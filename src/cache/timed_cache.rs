//! Time-based cache with TTL (Time To Live) support.
//!
//! This module provides a thread-safe cache that expires entries after a
//! specified duration, plus a single-flight loader so that concurrent misses
//! on the same key share one upstream fetch.
//!
//! Timestamps come from `tokio::time::Instant`, so tests can drive expiry
//! with a paused clock.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// A cache entry with a timestamp.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// A thread-safe cache with time-based expiration.
///
/// Entries are considered expired once `now - inserted_at >= ttl`. The cache
/// can be cloned cheaply (uses Arc internally); clones share storage.
///
/// # Memory Efficiency with Arc
///
/// For large values, wrap them in `Arc` to avoid cloning:
/// ```ignore
/// let cache = TimedCache::<String, Arc<Repository>>::new(Duration::from_secs(300));
/// cache.insert("repo".to_string(), Arc::new(repository));
/// ```
#[derive(Clone)]
pub struct TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    cache: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    in_flight: Arc<Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>>,
    ttl: Duration,
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new TimedCache with the specified TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Insert a value into the cache.
    ///
    /// If a value with the same key already exists, it is replaced whole.
    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, entry);
        }
    }

    /// Get a value from the cache if it exists and hasn't expired.
    ///
    /// Returns `None` if:
    /// - The key doesn't exist
    /// - The entry has expired (as old as the TTL or older)
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        if let Ok(cache) = self.cache.read() {
            if let Some(entry) = cache.get(key) {
                if now.duration_since(entry.inserted_at) < self.ttl {
                    return Some(entry.value.clone());
                }
            }
        }

        None
    }

    /// Get a fresh value, or load it with `fetch` and cache the result.
    ///
    /// Concurrent callers missing on the same key wait for the first caller's
    /// fetch instead of issuing their own; if that fetch fails, the next
    /// waiter retries. Errors are never cached. A successful fetch also
    /// reclaims expired entries, so distinct keys cannot accumulate forever.
    ///
    /// Returns the value and whether it was served from cache.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<(V, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok((value, true));
        }

        let gate = self.flight_gate(&key);
        let result = {
            let _guard = gate.lock().await;
            match self.get(&key) {
                // Another caller filled the slot while we waited
                Some(value) => Ok((value, true)),
                None => match fetch().await {
                    Ok(value) => {
                        // Misses are the only path that grows the map.
                        self.cleanup_expired();
                        self.insert(key.clone(), value.clone());
                        Ok((value, false))
                    }
                    Err(e) => Err(e),
                },
            }
        };
        self.release_flight_gate(&key, gate);
        result
    }

    fn flight_gate(&self, key: &K) -> Arc<tokio::sync::Mutex<()>> {
        match self.in_flight.lock() {
            Ok(mut in_flight) => in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone(),
            // A poisoned map only loses de-duplication, not correctness
            Err(_) => Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn release_flight_gate(&self, key: &K, gate: Arc<tokio::sync::Mutex<()>>) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            let idle = in_flight
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &gate) && Arc::strong_count(current) <= 2);
            if idle {
                in_flight.remove(key);
            }
        }
    }

    /// Check if a key exists in the cache and hasn't expired.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove a specific key from the cache.
    pub fn remove(&self, key: &K) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(key);
        }
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Remove all expired entries from the cache.
    ///
    /// This frees memory; it is not required for correctness since expired
    /// entries are ignored by `get()`.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();

        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
        }
    }

    /// Get the number of entries in the cache (including expired ones).
    pub fn len(&self) -> usize {
        if let Ok(cache) = self.cache.read() {
            cache.len()
        } else {
            0
        }
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the TTL duration for this cache.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<K, V> std::fmt::Debug for TimedCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}
