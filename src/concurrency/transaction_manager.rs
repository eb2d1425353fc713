//! Transaction lifecycle: issues transaction ids, tracks active
//! transactions, and releases locks on commit/abort.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;

use crate::common::{Error, Result};
use crate::concurrency::lock_manager::LockManager;
use crate::concurrency::transaction::{Transaction, TransactionState};

/// Owns the monotonic transaction-id counter and the active-transaction
/// map. Transactions carry no back-reference to this type (see
/// [`Transaction`]'s doc comment); callers pass the transaction id back
/// into [`Self::commit`] / [`Self::abort`].
pub struct TransactionManager {
    next_id: AtomicI64,
    active: Mutex<HashMap<i64, Transaction>>,
    lock_manager: Arc<LockManager>,
}

impl TransactionManager {
    pub fn new(lock_manager: Arc<LockManager>) -> Self {
        TransactionManager {
            next_id: AtomicI64::new(1),
            active: Mutex::new(HashMap::new()),
            lock_manager,
        }
    }

    /// Begin a new transaction: fresh id, `Active` state, inserted into
    /// the active map.
    pub fn begin(&self) -> Transaction {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let txn = Transaction::new(id);
        self.active.lock().insert(id, txn.clone());
        txn
    }

    /// Commit a transaction: releases all of its locks and removes it
    /// from the active map. Fails if the transaction is unknown or not
    /// `Active`.
    pub fn commit(&self, txn_id: i64) -> Result<()> {
        let mut active = self.active.lock();
        let Some(txn) = active.get_mut(&txn_id) else {
            return Err(Error::State(format!(
                "commit of unknown transaction {txn_id}"
            )));
        };
        if txn.state() != TransactionState::Active {
            return Err(Error::State(format!(
                "commit of non-active transaction {txn_id}"
            )));
        }
        txn.set_state(TransactionState::Committed);
        active.remove(&txn_id);
        drop(active);

        self.lock_manager.release_all(txn_id);
        Ok(())
    }

    /// Abort a transaction: releases all of its locks and removes it
    /// from the active map. Unlike commit, aborting an unknown
    /// transaction is tolerated (logged, not an error).
    pub fn abort(&self, txn_id: i64) {
        let mut active = self.active.lock();
        match active.get_mut(&txn_id) {
            Some(txn) => {
                txn.set_state(TransactionState::Aborted);
                active.remove(&txn_id);
                drop(active);
                self.lock_manager.release_all(txn_id);
            }
            None => {
                drop(active);
                warn!("abort of unknown transaction {txn_id}");
                self.lock_manager.release_all(txn_id);
            }
        }
    }

    /// Number of transactions currently active, for tests/diagnostics.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TransactionManager {
        TransactionManager::new(Arc::new(LockManager::new()))
    }

    #[test]
    fn test_begin_assigns_monotonic_ids() {
        let tm = manager();
        let t1 = tm.begin();
        let t2 = tm.begin();
        assert!(t2.id() > t1.id());
        assert_eq!(tm.active_count(), 2);
    }

    #[test]
    fn test_commit_removes_from_active_and_releases_locks() {
        let tm = manager();
        let txn = tm.begin();
        tm.commit(txn.id()).unwrap();
        assert_eq!(tm.active_count(), 0);
    }

    #[test]
    fn test_commit_unknown_fails() {
        let tm = manager();
        assert!(tm.commit(999).is_err());
    }

    #[test]
    fn test_commit_twice_fails() {
        let tm = manager();
        let txn = tm.begin();
        tm.commit(txn.id()).unwrap();
        assert!(tm.commit(txn.id()).is_err());
    }

    #[test]
    fn test_abort_unknown_is_tolerated() {
        let tm = manager();
        tm.abort(12345);
    }

    #[test]
    fn test_abort_releases_locks() {
        let lock_manager = Arc::new(LockManager::new());
        let tm = TransactionManager::new(lock_manager.clone());
        let txn = tm.begin();
        lock_manager.acquire_exclusive(txn.id(), "table:t");
        tm.abort(txn.id());
        assert!(lock_manager.held_resources(txn.id()).is_empty());
    }
}
