//! Time-bounded memoization with single-flight factories
//!
//! Concurrent misses for one key coalesce onto a single factory run; the
//! losers park on the per-key lock and read the freshly stored value.
//! Factory failures (including cancellation) store nothing, so every waiter
//! re-observes the miss.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Slot<T> {
    value: Option<(T, Instant)>,
}

/// Process-local memo cache with absolute TTL
pub struct MemoCache<T: Clone> {
    ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Mutex<Slot<T>>>>>,
}

impl<T: Clone> MemoCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, or run `factory` to produce it.
    ///
    /// The per-key lock is the single-flight token: the first miss holds it
    /// across the factory await, later arrivals park until it resolves. The
    /// outer map lock is only held long enough to clone the slot handle, so
    /// distinct keys never serialize each other.
    pub async fn get_or_try_insert<F, Fut, E>(&self, key: &str, factory: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(key.to_string())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(Slot { value: None }))
                })
                .clone()
        };

        let mut guard = slot.lock().await;
        if let Some((value, stored_at)) = &guard.value {
            if stored_at.elapsed() < self.ttl {
                return Ok(value.clone());
            }
        }

        let value = factory().await?;
        guard.value = Some((value.clone(), Instant::now()));
        Ok(value)
    }

    /// Key for memoized score insights.
    pub fn score_key(package: &str) -> String {
        format!("score:{}", package.to_uppercase())
    }

    /// Key for memoized dependency graphs.
    pub fn deps_key(package: &str, version: &str, with_dev: bool) -> String {
        let mut key = format!("deps:{}:{}", package.to_uppercase(), version.to_uppercase());
        if with_dev {
            key.push_str(":with-dev");
        }
        key
    }
}
