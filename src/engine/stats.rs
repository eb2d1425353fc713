//! A bounded ring buffer of recent query timings, for diagnostics.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct QueryStat {
    pub sql: String,
    pub duration: Duration,
    pub success: bool,
}

pub struct QueryStats {
    entries: Mutex<VecDeque<QueryStat>>,
    capacity: usize,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        QueryStats {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, sql: &str, duration: Duration, success: bool) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(QueryStat {
            sql: sql.to_string(),
            duration,
            success,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<QueryStat> {
        self.entries.lock().iter().cloned().collect()
    }
}

impl Default for QueryStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_ring() {
        let stats = QueryStats::with_capacity(3);
        for i in 0..5 {
            stats.record(&format!("SELECT {i}"), Duration::from_millis(1), true);
        }
        assert_eq!(stats.len(), 3);
        let snap = stats.snapshot();
        assert_eq!(snap[0].sql, "SELECT 2");
        assert_eq!(snap[2].sql, "SELECT 4");
    }
}
