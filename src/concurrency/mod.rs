//! Transaction and lock management.
//!
//! - [`transaction`] - transaction identity and lifecycle state
//! - [`lock_manager`] - per-resource shared/exclusive locking
//! - [`transaction_manager`] - transaction id issuance and active-set tracking

pub mod lock_manager;
pub mod transaction;
pub mod transaction_manager;

pub use lock_manager::LockManager;
pub use transaction::{Transaction, TransactionState};
pub use transaction_manager::TransactionManager;
