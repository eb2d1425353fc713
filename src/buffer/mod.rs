//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between the rest of the
//! engine and disk: a bounded map of page id to `Page` with LRU eviction
//! and dirty-page write-back through the `DiskManager`.

mod pool;

pub use pool::BufferPool;
