//! Bounded, time-expiring cache of computed scenarios.
//!
//! The cache is the only shared mutable state in the system. Every mutation
//! (insert, eviction, recency update, clear) happens under one lock, so
//! concurrent callers never observe a partially applied operation.
//!
//! [`ScenarioCache::get_or_compute`] adds single-flight behaviour on top: while
//! one caller computes the value for a key, other callers asking for the same
//! key wait for that result instead of starting their own computation.

use crate::errors::{AltEarthError, AltEarthResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default number of scenarios held before eviction
pub const DEFAULT_MAX_SIZE: usize = 100;
/// Default lifetime of a cached scenario
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Values that know the key they were stored under.
///
/// Used to detect entries whose contents do not match their slot.
pub trait CacheKeyed {
    fn cache_key(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub inserted_at: Instant,
    /// Logical access time, larger is more recent
    last_access: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_size: usize,
    pub ttl_hours: f64,
    /// Keys currently held, sorted
    pub keys: Vec<String>,
}

/// How a value returned by [`ScenarioCache::get_or_compute`] was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from a stored entry
    Hit,
    /// Computed by this caller and stored
    Computed,
    /// Produced by a concurrent caller's in-flight computation
    Joined,
}

impl CacheOutcome {
    /// Whether this caller avoided doing the computation itself
    pub fn is_cached(&self) -> bool {
        !matches!(self, CacheOutcome::Computed)
    }
}

enum Freshness {
    Fresh,
    Expired,
    Corrupt,
}

enum Landing<V> {
    Finished(AltEarthResult<V>),
    /// The computing caller went away without a result
    Abandoned,
}

struct Flight<V> {
    slot: Mutex<Option<Landing<V>>>,
    done: Condvar,
}

impl<V: Clone> Flight<V> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn publish(&self, landing: Landing<V>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(landing);
        self.done.notify_all();
    }

    /// The shared result, or `None` if the computation was abandoned
    fn wait(&self) -> Option<AltEarthResult<V>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match slot.as_ref() {
                Some(Landing::Finished(result)) => return Some(result.clone()),
                Some(Landing::Abandoned) => return None,
                None => {}
            }
            slot = self
                .done
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    in_flight: HashMap<String, Arc<Flight<V>>>,
    access_clock: u64,
}

impl<V: Clone + CacheKeyed> Inner<V> {
    fn touch(&mut self) -> u64 {
        self.access_clock += 1;
        self.access_clock
    }

    fn lookup(&mut self, key: &str, now: Instant, ttl: Duration) -> Option<V> {
        let freshness = match self.entries.get(key) {
            None => return None,
            Some(entry) if now.saturating_duration_since(entry.inserted_at) > ttl => {
                Freshness::Expired
            }
            Some(entry) if entry.key != key || entry.value.cache_key() != key => {
                Freshness::Corrupt
            }
            Some(_) => Freshness::Fresh,
        };

        match freshness {
            Freshness::Expired => {
                debug!("Cache entry {key} expired");
                self.entries.remove(key);
                None
            }
            Freshness::Corrupt => {
                let err = AltEarthError::CacheCorruption(format!(
                    "entry stored under {key} holds a value for another key"
                ));
                warn!("{err}; discarding entry");
                self.entries.remove(key);
                None
            }
            Freshness::Fresh => {
                let tick = self.touch();
                let entry = self.entries.get_mut(key)?;
                entry.last_access = tick;
                Some(entry.value.clone())
            }
        }
    }

    fn purge_expired(&mut self, now: Instant, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) <= ttl);
        before - self.entries.len()
    }

    fn evict_least_recently_used(&mut self) -> Option<String> {
        let key = self
            .entries
            .values()
            .min_by_key(|entry| entry.last_access)
            .map(|entry| entry.key.clone())?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// LRU cache with per-entry expiry and single-flight computation
pub struct ScenarioCache<V> {
    max_size: usize,
    ttl: Duration,
    inner: Mutex<Inner<V>>,
}

impl<V> fmt::Debug for ScenarioCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioCache")
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<V: Clone + CacheKeyed> Default for ScenarioCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }
}

impl<V: Clone + CacheKeyed> ScenarioCache<V> {
    /// Create an empty cache.
    ///
    /// A `max_size` of zero is treated as one.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            max_size: max_size.max(1),
            ttl,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                access_clock: 0,
            }),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while the lock is held cannot leave `Inner` half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a key, refreshing its recency on a hit
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Look up a key as of `now`
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        self.lock().lookup(key, now, self.ttl)
    }

    /// Store a value, evicting the least recently used entry if the cache is full
    pub fn put(&self, key: &str, value: V) {
        self.put_at(key, value, Instant::now())
    }

    /// Store a value as of `now`
    pub fn put_at(&self, key: &str, value: V, now: Instant) {
        let mut inner = self.lock();
        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_size {
            let expired = inner.purge_expired(now, self.ttl);
            if expired > 0 {
                debug!("Purged {expired} expired cache entries");
            }
            if inner.entries.len() >= self.max_size {
                if let Some(evicted) = inner.evict_least_recently_used() {
                    debug!("Evicted least recently used cache entry {evicted}");
                }
            }
        }
        let tick = inner.touch();
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                value,
                inserted_at: now,
                last_access: tick,
            },
        );
    }

    /// Remove every entry, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        info!("Cleared {count} cached scenarios");
        count
    }

    /// Eagerly drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        self.lock().purge_expired(Instant::now(), self.ttl)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut keys: Vec<String> = inner.entries.keys().cloned().collect();
        keys.sort();
        CacheStats {
            entries: inner.entries.len(),
            max_size: self.max_size,
            ttl_hours: self.ttl.as_secs_f64() / 3600.0,
            keys,
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// At most one computation per key is in flight. Callers arriving while a
    /// computation is running block until it finishes and share its result
    /// (including its error). If that computation is abandoned, waiting
    /// callers retry and one of them computes in its place. Failed
    /// computations are not cached.
    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> AltEarthResult<(V, CacheOutcome)>
    where
        F: FnOnce() -> AltEarthResult<V>,
    {
        let flight = loop {
            let mut inner = self.lock();
            if let Some(value) = inner.lookup(key, Instant::now(), self.ttl) {
                debug!("Cache hit for {key}");
                return Ok((value, CacheOutcome::Hit));
            }
            let existing = inner.in_flight.get(key).cloned();
            match existing {
                Some(flight) => {
                    drop(inner);
                    debug!("Joining in-flight computation for {key}");
                    match flight.wait() {
                        Some(result) => {
                            return result.map(|value| (value, CacheOutcome::Joined))
                        }
                        None => debug!("Retrying abandoned computation for {key}"),
                    }
                }
                None => {
                    debug!("Cache miss for {key}");
                    let flight = Arc::new(Flight::new());
                    inner.in_flight.insert(key.to_string(), Arc::clone(&flight));
                    break flight;
                }
            }
        };

        let mut guard = FlightGuard {
            cache: self,
            key,
            flight,
            finished: false,
        };
        let result = compute();
        if let Ok(value) = &result {
            self.put(key, value.clone());
        }
        guard.finish(Landing::Finished(result.clone()));
        result.map(|value| (value, CacheOutcome::Computed))
    }
}

/// Releases waiting callers even if the computation panics
struct FlightGuard<'a, V: Clone + CacheKeyed> {
    cache: &'a ScenarioCache<V>,
    key: &'a str,
    flight: Arc<Flight<V>>,
    finished: bool,
}

impl<V: Clone + CacheKeyed> FlightGuard<'_, V> {
    fn finish(&mut self, landing: Landing<V>) {
        self.cache.lock().in_flight.remove(self.key);
        self.flight.publish(landing);
        self.finished = true;
    }
}

impl<V: Clone + CacheKeyed> Drop for FlightGuard<'_, V> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Computation for {} was abandoned", self.key);
            self.finish(Landing::Abandoned);
        }
    }
}
