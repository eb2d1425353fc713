//! Per-resource shared/exclusive locking.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use parking_lot::{Condvar, Mutex};

/// The mode a transaction holds a resource in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Default)]
struct ResourceState {
    readers: usize,
    writer: bool,
}

struct Resource {
    state: Mutex<ResourceState>,
    available: Condvar,
}

impl Resource {
    fn new() -> Arc<Self> {
        Arc::new(Resource {
            state: Mutex::new(ResourceState::default()),
            available: Condvar::new(),
        })
    }
}

struct Inner {
    resources: HashMap<String, Arc<Resource>>,
    held: HashMap<i64, HashMap<String, LockMode>>,
}

/// Per-resource reader/writer locks, created lazily on first acquisition,
/// plus the set of resources each transaction currently holds.
///
/// There is no deadlock detection: statement-scoped execution acquires
/// exactly one resource per statement before commit, which makes
/// deadlock impossible within this engine's own access patterns.
pub struct LockManager {
    inner: Mutex<Inner>,
}

impl LockManager {
    pub fn new() -> Self {
        LockManager {
            inner: Mutex::new(Inner {
                resources: HashMap::new(),
                held: HashMap::new(),
            }),
        }
    }

    fn resource_for(&self, resource: &str) -> Arc<Resource> {
        let mut inner = self.inner.lock();
        inner
            .resources
            .entry(resource.to_string())
            .or_insert_with(Resource::new)
            .clone()
    }

    /// Acquire the shared (read) side of `resource` for `txn_id`,
    /// blocking while an exclusive holder is present.
    pub fn acquire_shared(&self, txn_id: i64, resource: &str) {
        let res = self.resource_for(resource);
        let mut state = res.state.lock();
        while state.writer {
            res.available.wait(&mut state);
        }
        state.readers += 1;
        drop(state);

        self.inner
            .lock()
            .held
            .entry(txn_id)
            .or_default()
            .insert(resource.to_string(), LockMode::Shared);
    }

    /// Acquire the exclusive (write) side of `resource` for `txn_id`,
    /// blocking while any reader or writer is present.
    pub fn acquire_exclusive(&self, txn_id: i64, resource: &str) {
        let res = self.resource_for(resource);
        let mut state = res.state.lock();
        while state.writer || state.readers > 0 {
            res.available.wait(&mut state);
        }
        state.writer = true;
        drop(state);

        self.inner
            .lock()
            .held
            .entry(txn_id)
            .or_default()
            .insert(resource.to_string(), LockMode::Exclusive);
    }

    /// Release whichever mode `txn_id` holds on `resource`, tolerating
    /// the case where it holds neither (used by [`Self::release_all`]).
    pub fn release(&self, txn_id: i64, resource: &str) {
        let mode = {
            let mut inner = self.inner.lock();
            inner
                .held
                .get_mut(&txn_id)
                .and_then(|resources| resources.remove(resource))
        };

        let Some(mode) = mode else {
            return;
        };

        let res = self.resource_for(resource);
        let mut state = res.state.lock();
        match mode {
            LockMode::Shared => {
                state.readers = state.readers.saturating_sub(1);
            }
            LockMode::Exclusive => {
                state.writer = false;
            }
        }
        drop(state);
        res.available.notify_all();
    }

    /// Release every resource `txn_id` currently holds.
    pub fn release_all(&self, txn_id: i64) {
        let resources: Vec<String> = {
            let mut inner = self.inner.lock();
            inner
                .held
                .remove(&txn_id)
                .map(|m| m.into_keys().collect())
                .unwrap_or_default()
        };
        for resource in resources {
            self.release(txn_id, &resource);
        }
    }

    /// Resources currently held by `txn_id`, for tests and diagnostics.
    pub fn held_resources(&self, txn_id: i64) -> Vec<String> {
        self.inner
            .lock()
            .held
            .get(&txn_id)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn log_unknown_abort(txn_id: i64) {
    warn!("abort of unknown transaction {txn_id}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_shared_locks_do_not_block_each_other() {
        let lm = LockManager::new();
        lm.acquire_shared(1, "table:t");
        lm.acquire_shared(2, "table:t");
        assert_eq!(lm.held_resources(1), vec!["table:t".to_string()]);
        lm.release_all(1);
        lm.release_all(2);
    }

    #[test]
    fn test_release_all_clears_everything() {
        let lm = LockManager::new();
        lm.acquire_shared(1, "table:a");
        lm.acquire_exclusive(1, "table:b");
        lm.release_all(1);
        assert!(lm.held_resources(1).is_empty());
    }

    #[test]
    fn test_release_tolerates_unheld_resource() {
        let lm = LockManager::new();
        lm.release(42, "table:nothing");
    }

    #[test]
    fn test_exclusive_blocks_until_shared_released() {
        let lm = Arc::new(LockManager::new());
        lm.acquire_shared(1, "table:t");

        let lm2 = lm.clone();
        let got_it = Arc::new(AtomicBool::new(false));
        let got_it2 = got_it.clone();
        let barrier = Arc::new(Barrier::new(2));
        let barrier2 = barrier.clone();

        let handle = thread::spawn(move || {
            barrier2.wait();
            lm2.acquire_exclusive(2, "table:t");
            got_it2.store(true, Ordering::SeqCst);
            lm2.release_all(2);
        });

        barrier.wait();
        thread::sleep(std::time::Duration::from_millis(50));
        assert!(!got_it.load(Ordering::SeqCst));

        lm.release_all(1);
        handle.join().unwrap();
        assert!(got_it.load(Ordering::SeqCst));
    }
}
