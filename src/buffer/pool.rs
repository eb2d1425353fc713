//! Bounded LRU buffer pool with dirty-page write-back.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use parking_lot::Mutex;

use crate::common::{PageId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

struct Inner {
    disk: DiskManager,
    max_pages: usize,
    /// Resident pages in LRU order: front is least-recently-used, back
    /// is most-recently-used. [`IndexMap`] gives O(1)-ish lookup plus a
    /// cheap move-to-back via `shift_remove` + re-insert.
    pages: IndexMap<PageId, Page>,
}

impl Inner {
    fn touch(&mut self, page_id: PageId) {
        if let Some(page) = self.pages.shift_remove(&page_id) {
            self.pages.insert(page_id, page);
        }
    }

    fn evict_if_needed(&mut self) -> Result<()> {
        while self.pages.len() > self.max_pages {
            let (evict_id, evict_page) = self.pages.shift_remove_index(0).expect("pool non-empty");
            if evict_page.is_dirty() {
                self.disk.write_page(&evict_page)?;
            }
            debug!("buffer pool evicted page {evict_id}");
        }
        Ok(())
    }
}

/// Bounded LRU cache of [`Page`] values keyed by page id, backed by a
/// [`DiskManager`]. The pool is serialized behind a single coarse mutex
/// — the lock manager above it gates concurrent table access, so the
/// pool needs no finer-grained synchronization of its own.
pub struct BufferPool {
    inner: Mutex<Inner>,
}

impl BufferPool {
    pub fn new(disk: DiskManager, max_pages: usize) -> Self {
        BufferPool {
            inner: Mutex::new(Inner {
                disk,
                max_pages,
                pages: IndexMap::new(),
            }),
        }
    }

    /// Number of pages currently resident.
    pub fn resident_count(&self) -> usize {
        self.inner.lock().pages.len()
    }

    /// Fetch a copy of a page, constructing a fresh empty one if neither
    /// resident nor present on disk. Marks the page most-recently-used.
    pub fn get_page(&self, page_id: PageId) -> Result<Page> {
        let mut inner = self.inner.lock();

        if inner.pages.contains_key(&page_id) {
            inner.touch(page_id);
        } else {
            let page = match inner.disk.read_page(page_id)? {
                Some(page) => page,
                None => Page::new(page_id),
            };
            inner.pages.insert(page_id, page);
            inner.evict_if_needed()?;
        }

        Ok(inner.pages.get(&page_id).expect("just inserted").clone())
    }

    /// Allocate a brand new page on disk and return it resident and
    /// empty.
    pub fn new_page(&self) -> Result<Page> {
        let mut inner = self.inner.lock();
        let page_id = inner.disk.allocate_new_page()?;
        let page = Page::new(page_id);
        inner.pages.insert(page_id, page.clone());
        inner.evict_if_needed()?;
        Ok(page)
    }

    /// Write a mutated page back into the pool, replacing the resident
    /// copy and marking it most-recently-used. Callers that mutate a
    /// page returned by [`Self::get_page`] call this to make the
    /// mutation visible to later fetches and to eviction/flush.
    pub fn put_page(&self, page: Page) -> Result<()> {
        let mut inner = self.inner.lock();
        let page_id = page.page_id();
        inner.pages.insert(page_id, page);
        inner.touch(page_id);
        inner.evict_if_needed()
    }

    /// Flush a single resident page if dirty.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(page) = inner.pages.get(&page_id) {
            if page.is_dirty() {
                let page = page.clone();
                inner.disk.write_page(&page)?;
                inner.pages.get_mut(&page_id).unwrap().mark_clean();
            }
        }
        Ok(())
    }

    /// Flush every dirty resident page.
    pub fn flush_all(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let dirty_ids: Vec<PageId> = inner
            .pages
            .iter()
            .filter(|(_, p)| p.is_dirty())
            .map(|(id, _)| *id)
            .collect();
        for id in dirty_ids {
            let page = inner.pages.get(&id).unwrap().clone();
            inner.disk.write_page(&page)?;
            inner.pages.get_mut(&id).unwrap().mark_clean();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pool(max_pages: usize) -> (tempfile::TempDir, BufferPool) {
        let dir = tempdir().unwrap();
        let disk = DiskManager::open_or_create(dir.path(), "db").unwrap();
        (dir, BufferPool::new(disk, max_pages))
    }

    #[test]
    fn test_new_page_and_mutate() {
        let (_dir, pool) = pool(10);
        let mut page = pool.new_page().unwrap();
        page.add_record(b"hi").unwrap();
        assert!(page.is_dirty());
        pool.put_page(page).unwrap();
        let fetched = pool.get_page(PageId::new(0)).unwrap();
        assert_eq!(fetched.records()[0], b"hi");
    }

    #[test]
    fn test_bound_enforced() {
        let (_dir, pool) = pool(2);
        let a = pool.new_page().unwrap().page_id();
        let b = pool.new_page().unwrap().page_id();
        let _c = pool.new_page().unwrap().page_id();
        assert!(pool.resident_count() <= 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_lru_eviction_order() {
        let (_dir, pool) = pool(2);
        let a = pool.new_page().unwrap().page_id();
        let b = pool.new_page().unwrap().page_id();

        // access order: get(a), get(b), get(a) -> a is MRU, b is LRU
        pool.get_page(a).unwrap();
        pool.get_page(b).unwrap();
        pool.get_page(a).unwrap();

        // third distinct access should evict b, not a
        let _c = pool.new_page().unwrap();

        assert_eq!(pool.resident_count(), 2);
        let resident: Vec<PageId> = pool.inner.lock().pages.keys().copied().collect();
        assert!(resident.contains(&a));
        assert!(!resident.contains(&b));
    }

    #[test]
    fn test_flush_all_cleans_dirty_pages() {
        let (_dir, pool) = pool(10);
        let mut page = pool.new_page().unwrap();
        page.add_record(b"data").unwrap();
        pool.put_page(page).unwrap();
        pool.flush_all().unwrap();
        let fetched = pool.get_page(PageId::new(0)).unwrap();
        assert!(!fetched.is_dirty());
    }
}
