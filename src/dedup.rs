//! In-flight request deduplication.
//!
//! Concurrent calls that derive the same [`CacheKey`] share a single execution.
//! The operation runs as its own task, so it settles (and its entry is removed)
//! even when the caller that started it goes away.

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::cache::CacheKey;
use crate::{Error, ErrorContext, Result};

type PendingFuture<V> = Shared<BoxFuture<'static, Result<V>>>;
type PendingMap<V> = Arc<Mutex<HashMap<CacheKey, PendingFuture<V>>>>;

fn lock<V>(pending: &PendingMap<V>) -> MutexGuard<'_, HashMap<CacheKey, PendingFuture<V>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the pending entry when the operation settles, including by panic.
struct PendingGuard<V> {
    pending: PendingMap<V>,
    key: CacheKey,
}

impl<V> Drop for PendingGuard<V> {
    fn drop(&mut self) {
        lock(&self.pending).remove(&self.key);
    }
}

pub struct RequestDeduplicator<V> {
    pending: PendingMap<V>,
}

impl<V> Clone for RequestDeduplicator<V> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<V> Default for RequestDeduplicator<V> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V> RequestDeduplicator<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` unless an identical one is already pending, in which case
    /// join it. Every caller sharing a key observes the same outcome.
    pub async fn run<F, Fut>(&self, key: CacheKey, operation: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let shared = {
            let mut pending = lock(&self.pending);
            if let Some(existing) = pending.get(&key) {
                debug!(key = %key, "joining in-flight request");
                existing.clone()
            } else {
                let fut = operation();
                // The lock is held until the entry is inserted, so the guard's
                // removal can never run ahead of registration.
                let guard = PendingGuard {
                    pending: Arc::clone(&self.pending),
                    key: key.clone(),
                };
                let task = tokio::spawn(async move {
                    let _guard = guard;
                    fut.await
                });
                let shared = task
                    .map(|joined| {
                        joined.unwrap_or_else(|e| {
                            Err(Error::runtime_with_context(
                                format!("pending request task failed: {}", e),
                                ErrorContext::new().with_source("request_deduplicator"),
                            ))
                        })
                    })
                    .boxed()
                    .shared();
                pending.insert(key, shared.clone());
                shared
            }
        };
        shared.await
    }

    /// Number of distinct keys currently executing.
    pub fn in_flight(&self) -> usize {
        lock(&self.pending).len()
    }
}
