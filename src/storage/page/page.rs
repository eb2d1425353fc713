//! In-memory image of one on-disk page.

use crate::common::config::{HEADER_SIZE, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::page_header::PageHeader;

/// A fixed-size page: a 16-byte header followed by a sequence of
/// length-prefixed records packed from the low end upward.
///
/// Records are *not* removable in place — the page format has no
/// tombstone or compaction support, matching the spec's description of
/// a page as a simple append-only record area. A page's indexed
/// structures (B-tree, Table) live above this layer and are rebuilt
/// from records on load rather than persisted inside the page itself.
#[derive(Debug, Clone)]
pub struct Page {
    header: PageHeader,
    records: Vec<Vec<u8>>,
    dirty: bool,
}

impl Page {
    /// Construct a fresh, empty page with the given id.
    pub fn new(page_id: PageId) -> Self {
        Page {
            header: PageHeader::empty(page_id, (PAGE_SIZE - HEADER_SIZE) as i32),
            records: Vec::new(),
            dirty: false,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.header.page_id
    }

    pub fn record_count(&self) -> i32 {
        self.header.record_count
    }

    pub fn free_space(&self) -> i32 {
        self.header.free_space
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn records(&self) -> &[Vec<u8>] {
        &self.records
    }

    /// Append a record. Fails if the page does not have `4 + data.len()`
    /// bytes of free space.
    pub fn add_record(&mut self, data: &[u8]) -> Result<usize> {
        let needed = 4 + data.len() as i32;
        if needed > self.header.free_space {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::OutOfMemory,
                format!(
                    "page {} has {} bytes free, record needs {}",
                    self.header.page_id, self.header.free_space, needed
                ),
            )));
        }
        self.records.push(data.to_vec());
        self.header.record_count += 1;
        self.header.free_space -= needed;
        self.dirty = true;
        Ok(self.records.len() - 1)
    }

    /// Verify the page accounting invariant: `free_space = PAGE_SIZE -
    /// HEADER_SIZE - sum(4 + len)` and `record_count` matches the
    /// resident record count.
    pub fn check_invariants(&self) -> bool {
        let used: i32 = self.records.iter().map(|r| 4 + r.len() as i32).sum();
        self.header.free_space == (PAGE_SIZE - HEADER_SIZE) as i32 - used
            && self.header.record_count as usize == self.records.len()
    }

    /// Serialize into exactly [`PAGE_SIZE`] bytes.
    pub fn to_bytes(&self) -> [u8; PAGE_SIZE] {
        let mut buf = [0u8; PAGE_SIZE];
        self.header.write_to(&mut buf[0..HEADER_SIZE]);
        let mut offset = HEADER_SIZE;
        for record in &self.records {
            let len = record.len() as i32;
            buf[offset..offset + 4].copy_from_slice(&len.to_le_bytes());
            offset += 4;
            buf[offset..offset + record.len()].copy_from_slice(record);
            offset += record.len();
        }
        buf
    }

    /// Parse a page from exactly [`PAGE_SIZE`] bytes.
    ///
    /// The serialized `page_id` must equal `expected_id`; a mismatch is
    /// treated as a fatal load error per the on-disk format's invariant.
    pub fn from_bytes(buf: &[u8; PAGE_SIZE], expected_id: PageId) -> Result<Self> {
        let header = PageHeader::read_from(&buf[0..HEADER_SIZE]);
        if header.page_id != expected_id {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "page id mismatch: expected {}, found {} on disk",
                    expected_id, header.page_id
                ),
            )));
        }

        let mut records = Vec::with_capacity(header.record_count.max(0) as usize);
        let mut offset = HEADER_SIZE;
        for _ in 0..header.record_count {
            let len = i32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap()) as usize;
            offset += 4;
            records.push(buf[offset..offset + len].to_vec());
            offset += len;
        }

        Ok(Page {
            header,
            records,
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_is_empty() {
        let page = Page::new(PageId::new(0));
        assert_eq!(page.record_count(), 0);
        assert_eq!(page.free_space(), (PAGE_SIZE - HEADER_SIZE) as i32);
        assert!(page.check_invariants());
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_add_record_updates_accounting() {
        let mut page = Page::new(PageId::new(1));
        page.add_record(b"hello").unwrap();
        assert_eq!(page.record_count(), 1);
        assert_eq!(page.free_space(), (PAGE_SIZE - HEADER_SIZE) as i32 - 9);
        assert!(page.check_invariants());
        assert!(page.is_dirty());
    }

    #[test]
    fn test_add_record_rejects_when_full() {
        let mut page = Page::new(PageId::new(0));
        let big = vec![0u8; PAGE_SIZE];
        assert!(page.add_record(&big).is_err());
    }

    #[test]
    fn test_round_trip() {
        let mut page = Page::new(PageId::new(3));
        page.add_record(b"one").unwrap();
        page.add_record(b"two-longer").unwrap();
        let bytes = page.to_bytes();
        let restored = Page::from_bytes(&bytes, PageId::new(3)).unwrap();
        assert_eq!(restored.record_count(), 2);
        assert_eq!(restored.records()[0], b"one");
        assert_eq!(restored.records()[1], b"two-longer");
        assert!(restored.check_invariants());
    }

    #[test]
    fn test_page_id_mismatch_is_fatal() {
        let page = Page::new(PageId::new(5));
        let bytes = page.to_bytes();
        assert!(Page::from_bytes(&bytes, PageId::new(6)).is_err());
    }
}
