//! Time-to-live cache with per-key single-flight refresh.
//!
//! Each key owns an async mutex that is held across the refresh, so callers
//! racing on a miss wait for the first fetch and then read its result instead
//! of hitting the upstream again.

use std::{collections::HashMap, future::Future, hash::Hash, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{utils::Clock, Result};

/// A stored payload and the instant it was captured.
#[derive(Debug)]
pub struct CachedResult<V> {
    pub captured_at: DateTime<Utc>,
    pub payload: Arc<V>,
}

impl<V> Clone for CachedResult<V> {
    fn clone(&self) -> Self {
        Self {
            captured_at: self.captured_at,
            payload: self.payload.clone(),
        }
    }
}

impl<V> CachedResult<V> {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return true;
        };
        now.signed_duration_since(self.captured_at) < ttl
    }
}

type Slot<V> = Arc<Mutex<Option<CachedResult<V>>>>;

pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the fresh payload for `key`, or run `fetch` and store its result.
    ///
    /// A failed fetch is propagated and leaves any previous entry untouched;
    /// a key that never produced a value is forgotten again.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let slot = self.slot(key.clone()).await;
        let mut entry = slot.lock().await;

        let now = self.clock.now();
        if let Some(cached) = entry.as_ref() {
            if cached.is_fresh(now, self.ttl) {
                return Ok(cached.payload.clone());
            }
        }

        let payload = match fetch().await {
            Ok(v) => Arc::new(v),
            Err(e) => {
                if entry.is_none() {
                    drop(entry);
                    self.forget_empty(&key, &slot).await;
                }
                return Err(e);
            }
        };
        *entry = Some(CachedResult {
            captured_at: now,
            payload: payload.clone(),
        });
        Ok(payload)
    }

    /// Current entry for `key`, fresh or stale.
    ///
    /// Expired entries of other keys are dropped whenever a new key is
    /// inserted, so a stale entry stays readable only until then.
    pub async fn peek(&self, key: &K) -> Option<CachedResult<V>> {
        let slot = self.slots.lock().await.get(key).cloned()?;
        let entry = slot.lock().await;
        entry.clone()
    }

    async fn slot(&self, key: K) -> Slot<V> {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get(&key) {
            return slot.clone();
        }

        // Sweep expired slots; busy ones are mid-refresh and stay.
        let (now, ttl) = (self.clock.now(), self.ttl);
        slots.retain(|_, slot| match slot.try_lock() {
            Ok(entry) => entry.as_ref().is_some_and(|c| c.is_fresh(now, ttl)),
            Err(_) => true,
        });

        let slot: Slot<V> = Arc::new(Mutex::new(None));
        slots.insert(key, slot.clone());
        slot
    }

    async fn forget_empty(&self, key: &K, slot: &Slot<V>) {
        let mut slots = self.slots.lock().await;
        let unused = slots.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && current.try_lock().is_ok_and(|e| e.is_none())
        });
        if unused {
            slots.remove(key);
        }
    }

    #[cfg(test)]
    pub(crate) async fn slot_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}
