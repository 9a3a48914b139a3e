//! Per-key mutual exclusion for read-modify-write sequences.
//!
//! The store hands out one lock per hierarchy location: a result-level key
//! guards the read-allocate-append-persist sequence for one result, a
//! container-level key guards directory creation and pruning for one
//! (model, model version) pair, and a model-level key guards model
//! directory removal. Lock acquisition order is always bottom-up
//! (result, then container, then model), so the paths that hold two locks
//! at once cannot deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lock a registry handle, recovering from poisoning.
///
/// A poisoned lock only means a peer thread panicked mid-operation; the
/// document on disk is still consistent because persistence is an atomic
/// replacement, so the guarded region can safely proceed.
pub(crate) fn hold(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

/// A registry of named locks, one per hierarchy location ever touched.
///
/// Entries are never evicted; the registry is bounded by the set of
/// locations the process has addressed.
pub(crate) struct LockRegistry {
    locks: Mutex<HashMap<Vec<String>, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub(crate) fn new() -> Self {
        LockRegistry {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the lock for a hierarchy location, creating it on first use.
    ///
    /// The caller locks the returned handle and holds the guard for the
    /// duration of its read-modify-write sequence.
    pub(crate) fn acquire(&self, key: &[&str]) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(key.iter().map(|s| s.to_string()).collect())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn same_key_yields_same_lock() {
        let registry = LockRegistry::new();
        let a = registry.acquire(&["m0", "v0", "r0"]);
        let b = registry.acquire(&["m0", "v0", "r0"]);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_keys_yield_distinct_locks() {
        let registry = LockRegistry::new();
        let a = registry.acquire(&["m0", "v0", "r0"]);
        let b = registry.acquire(&["m0", "v0", "r1"]);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn lock_excludes_concurrent_holders() {
        let registry = Arc::new(LockRegistry::new());
        let counter = Arc::new(Mutex::new(0u32));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    let lock = registry.acquire(&["m0", "v0", "r0"]);
                    let _guard = lock.lock().unwrap();
                    let mut count = counter.lock().unwrap();
                    *count += 1;
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*counter.lock().unwrap(), 8);
    }
}
