//! A bounded, TTL-expiring cache of SELECT results keyed by raw SQL
//! text, invalidated by table name whenever a write statement runs.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::sql::executor::QueryResult;

const DEFAULT_MAX_ENTRIES: usize = 1000;
const DEFAULT_TTL_SECS: u64 = 300;

struct Entry {
    result: QueryResult,
    created_at: Instant,
}

struct Inner {
    entries: IndexMap<String, Entry>,
    max_entries: usize,
    ttl: Duration,
}

impl Inner {
    fn touch(&mut self, key: &str) {
        if let Some(index) = self.entries.get_index_of(key) {
            if let Some((k, v)) = self.entries.shift_remove_index(index) {
                self.entries.insert(k, v);
            }
        }
    }

    fn evict_if_needed(&mut self) {
        while self.entries.len() > self.max_entries {
            self.entries.shift_remove_index(0);
        }
    }
}

/// Caches SELECT/JOIN results by the exact SQL text that produced them.
/// Entries expire after a TTL and are invalidated en masse whenever a
/// write touches the table(s) they read from.
pub struct QueryCache {
    inner: Mutex<Inner>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS)
    }

    pub fn with_capacity(max_entries: usize, ttl_seconds: u64) -> Self {
        QueryCache {
            inner: Mutex::new(Inner {
                entries: IndexMap::new(),
                max_entries,
                ttl: Duration::from_secs(ttl_seconds),
            }),
        }
    }

    /// Look up `sql` verbatim. A hit outside the TTL window is treated
    /// as a miss and dropped.
    pub fn get(&self, sql: &str) -> Option<QueryResult> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(sql) {
            Some(entry) => entry.created_at.elapsed() > inner.ttl,
            None => return None,
        };
        if expired {
            inner.entries.shift_remove(sql);
            return None;
        }
        inner.touch(sql);
        inner.entries.get(sql).map(|e| e.result.clone())
    }

    /// Store `result` under `sql`, but only if it is a read result —
    /// writes are never cache entries themselves.
    pub fn put(&self, sql: &str, result: QueryResult) {
        if !result.is_select() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.entries.insert(
            sql.to_string(),
            Entry {
                result,
                created_at: Instant::now(),
            },
        );
        inner.evict_if_needed();
    }

    /// Drop every cached entry whose SQL text references `table` as a
    /// FROM or JOIN target, by simple substring search over the
    /// uppercased text.
    pub fn invalidate_table(&self, table: &str) {
        let needle_from = format!("FROM {}", table.to_ascii_uppercase());
        let needle_join = format!("JOIN {}", table.to_ascii_uppercase());
        let mut inner = self.inner.lock();
        inner.entries.retain(|sql, _| {
            let upper = sql.to_ascii_uppercase();
            !(upper.contains(&needle_from) || upper.contains(&needle_join))
        });
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;
    use indexmap::IndexMap as Map;
    use std::thread::sleep;

    fn select_result() -> QueryResult {
        QueryResult::Select {
            records: vec![Record::new(1, Map::new())],
        }
    }

    #[test]
    fn test_put_and_get_roundtrip() {
        let cache = QueryCache::new();
        cache.put("SELECT * FROM users", select_result());
        assert!(cache.get("SELECT * FROM users").is_some());
    }

    #[test]
    fn test_non_select_not_cached() {
        let cache = QueryCache::new();
        cache.put("INSERT INTO users (id) VALUES (1)", QueryResult::Insert { affected: 1 });
        assert!(cache.get("INSERT INTO users (id) VALUES (1)").is_none());
    }

    #[test]
    fn test_invalidate_table_drops_matching_entries() {
        let cache = QueryCache::new();
        cache.put("SELECT * FROM users WHERE id = 1", select_result());
        cache.put("SELECT * FROM accounts", select_result());
        cache.invalidate_table("users");
        assert!(cache.get("SELECT * FROM users WHERE id = 1").is_none());
        assert!(cache.get("SELECT * FROM accounts").is_some());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = QueryCache::with_capacity(100, 0);
        cache.put("SELECT * FROM users", select_result());
        sleep(Duration::from_millis(5));
        assert!(cache.get("SELECT * FROM users").is_none());
    }

    #[test]
    fn test_bounded_eviction() {
        let cache = QueryCache::with_capacity(2, 300);
        cache.put("SELECT 1", select_result());
        cache.put("SELECT 2", select_result());
        cache.put("SELECT 3", select_result());
        assert_eq!(cache.len(), 2);
        assert!(cache.get("SELECT 1").is_none());
    }

    #[test]
    fn test_clear() {
        let cache = QueryCache::new();
        cache.put("SELECT * FROM users", select_result());
        cache.clear();
        assert!(cache.is_empty());
    }
}
