//! Lazily loaded, single-flight snapshot cache.
//!
//! The cache owns the current `Arc<T>` snapshot. Readers clone the `Arc` and
//! never observe a half-built value; writers replace the whole snapshot.
//!
//! # Single-flight
//!
//! When the snapshot is missing or stale, the first caller runs the loader
//! with the lock released. Callers arriving while that load is in flight
//! wait on a condition variable and receive the same outcome, success or
//! error, instead of starting a second load.

use crate::error::Result;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct Slot<T> {
    current: Option<Arc<T>>,
    loaded_at: Option<Instant>,
    stale: bool,
    in_flight: bool,
    /// Bumped every time a load finishes, successful or not.
    generation: u64,
    last_error: Option<crate::error::ExforgeError>,
}

/// Snapshot cache with optional time-based expiry.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    slot: Mutex<Slot<T>>,
    loaded: Condvar,
    ttl: Option<Duration>,
}

impl<T> SnapshotCache<T> {
    /// Create an empty cache. `ttl = None` means snapshots never expire.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            slot: Mutex::new(Slot {
                current: None,
                loaded_at: None,
                stale: false,
                in_flight: false,
                generation: 0,
                last_error: None,
            }),
            loaded: Condvar::new(),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // A poisoned slot only means a loader panicked; the data is still coherent.
        self.slot.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn is_fresh(&self, slot: &Slot<T>) -> bool {
        if slot.current.is_none() || slot.stale {
            return false;
        }
        match (self.ttl, slot.loaded_at) {
            (Some(ttl), Some(at)) => at.elapsed() < ttl,
            _ => true,
        }
    }

    /// The current snapshot, if one has been loaded (fresh or not).
    pub fn peek(&self) -> Option<Arc<T>> {
        self.lock().current.clone()
    }

    /// Mark the snapshot stale so the next `get_or_load` reloads it.
    pub fn invalidate(&self) {
        self.lock().stale = true;
    }

    /// Return the snapshot, loading it first when missing or stale.
    ///
    /// Concurrent callers that find the snapshot stale share one call to
    /// `loader`.
    pub fn get_or_load<F>(&self, loader: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut slot = self.lock();

        if self.is_fresh(&slot)
            && let Some(current) = &slot.current
        {
            return Ok(Arc::clone(current));
        }

        if slot.in_flight {
            let waiting_for = slot.generation;
            while slot.in_flight && slot.generation == waiting_for {
                slot = self
                    .loaded
                    .wait(slot)
                    .unwrap_or_else(|poison| poison.into_inner());
            }
            if let Some(err) = &slot.last_error {
                return Err(err.clone());
            }
            if let Some(current) = &slot.current {
                return Ok(Arc::clone(current));
            }
            // The loader panicked before producing anything; fall through and load.
        }

        slot.in_flight = true;
        drop(slot);

        self.run_load(loader)
    }

    /// Load unconditionally and swap the result in.
    ///
    /// Waits for any load already in flight first so two loads never overlap.
    pub fn refresh<F>(&self, loader: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut slot = self.lock();
        while slot.in_flight {
            slot = self
                .loaded
                .wait(slot)
                .unwrap_or_else(|poison| poison.into_inner());
        }
        slot.in_flight = true;
        drop(slot);

        self.run_load(loader)
    }

    /// Replace the snapshot with a value derived from the current one.
    ///
    /// The whole snapshot is swapped while the lock is held, so readers see
    /// either the old value or the new one.
    pub fn update<F>(&self, change: F) -> Option<Arc<T>>
    where
        F: FnOnce(&T) -> T,
    {
        let mut slot = self.lock();
        while slot.in_flight {
            slot = self
                .loaded
                .wait(slot)
                .unwrap_or_else(|poison| poison.into_inner());
        }
        let next = Arc::new(change(slot.current.as_deref()?));
        slot.current = Some(Arc::clone(&next));
        Some(next)
    }

    fn run_load<F>(&self, loader: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut guard = InFlightGuard {
            cache: self,
            finished: false,
        };
        let outcome = loader();

        let mut slot = self.lock();
        slot.in_flight = false;
        slot.generation += 1;
        guard.finished = true;

        let result = match outcome {
            Ok(value) => {
                let value = Arc::new(value);
                slot.current = Some(Arc::clone(&value));
                slot.loaded_at = Some(Instant::now());
                slot.stale = false;
                slot.last_error = None;
                debug!(generation = slot.generation, "snapshot loaded");
                Ok(value)
            }
            Err(err) => {
                slot.last_error = Some(err.clone());
                Err(err)
            }
        };

        drop(slot);
        self.loaded.notify_all();
        result
    }
}

/// Clears the in-flight flag if the loader unwinds, so waiters are released.
struct InFlightGuard<'a, T> {
    cache: &'a SnapshotCache<T>,
    finished: bool,
}

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            let mut slot = self.cache.lock();
            slot.in_flight = false;
            slot.generation += 1;
            slot.last_error = None;
            drop(slot);
            self.cache.loaded.notify_all();
        }
    }
}
