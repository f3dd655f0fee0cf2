//! Keyed Async Locks
//!
//! Settlement and escrow operations serialize per key so that two
//! tasks can never interleave a read-check-write sequence on the same
//! account or settlement slot. The lock table grows with the key space
//! and is never pruned; entries are one `Arc<Mutex>` each.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

pub struct KeyLocks<K> {
    locks: RwLock<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyLocks<K> {
    fn default() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a key, creating it on first use. The guard
    /// owns its mutex, so it may be held across await points.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(&key).cloned();
        let lock = match existing {
            Some(lock) => lock,
            None => self
                .locks
                .write()
                .await
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone(),
        };
        lock.lock_owned().await
    }
}
