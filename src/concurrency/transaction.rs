//! Transaction identity and lifecycle state.

use chrono::{DateTime, Utc};

/// A transaction's lifecycle state. Created `Active`; commits or aborts
/// exactly once; a second commit/abort on a non-`Active` transaction is
/// an error (enforced by [`super::transaction_manager::TransactionManager`],
/// not by this type).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    Aborted,
}

/// A transaction handle.
///
/// Per the source system's back-reference pattern (child holding a
/// reference to its manager), this type deliberately carries no link to
/// the [`super::transaction_manager::TransactionManager`] that created
/// it — callers pass `txn.id()` back into manager operations
/// (`commit(txn_id)`, `abort(txn_id)`) instead.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: i64,
    created_at: DateTime<Utc>,
    state: TransactionState,
}

impl Transaction {
    pub(super) fn new(id: i64) -> Self {
        Transaction {
            id,
            created_at: Utc::now(),
            state: TransactionState::Active,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub(super) fn set_state(&mut self, state: TransactionState) {
        self.state = state;
    }
}
