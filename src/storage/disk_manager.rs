//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] owns one append-and-seek capable file per database,
//! located at `<dir>/<db_name>.ndb`, creating the directory if missing.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::common::config::PAGE_SIZE;
use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// ```
/// Page N lives at file offset `N × PAGE_SIZE`.
///
/// # Thread Safety
/// `DiskManager` is single-threaded; [`crate::buffer::pool::BufferPool`]
/// serializes access to it.
///
/// # Durability
/// Every write is followed by `fsync()`. There is no WAL: crash safety is
/// explicitly weak, and dirty pages are only guaranteed flushed on a clean
/// shutdown.
pub struct DiskManager {
    file: File,
    path: PathBuf,
}

impl DiskManager {
    /// Open `<dir>/<db_name>.ndb`, creating the directory and file if
    /// either is missing.
    pub fn open_or_create<P: AsRef<Path>>(dir: P, db_name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{db_name}.ndb"));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        Ok(Self { file, path })
    }

    /// Current length of the database file, in pages.
    fn page_count(&self) -> Result<u64> {
        let len = self.file.metadata()?.len();
        Ok(len / PAGE_SIZE as u64)
    }

    /// Read a page from disk.
    ///
    /// Returns `None` if `page_id` is past the end of the file, or if a
    /// short read occurs (both are logged). Parses the header and
    /// validates the page id; a mismatch is a fatal load error.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Option<Page>> {
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        let file_len = self.file.metadata()?.len();
        if offset >= file_len {
            return Ok(None);
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; PAGE_SIZE];
        match self.file.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                warn!(
                    "short read for page {page_id} in {}: treating as missing",
                    self.path.display()
                );
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        Page::from_bytes(&buf, page_id).map(Some)
    }

    /// Write a page to disk, syncing to durable storage before returning.
    pub fn write_page(&mut self, page: &Page) -> Result<()> {
        let offset = (page.page_id().0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&page.to_bytes())?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Allocate a new page id and extend the file by one page of zeros.
    pub fn allocate_new_page(&mut self) -> Result<PageId> {
        let new_id = self.page_count()? as i32;
        let offset = (new_id as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.sync_all()?;
        Ok(PageId::new(new_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_or_create_creates_dir_and_file() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        let dm = DiskManager::open_or_create(&nested, "mydb").unwrap();
        assert!(nested.join("mydb.ndb").exists());
        assert_eq!(dm.page_count().unwrap(), 0);
    }

    #[test]
    fn test_read_past_eof_returns_none() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::open_or_create(dir.path(), "db").unwrap();
        assert!(dm.read_page(PageId::new(0)).unwrap().is_none());
    }

    #[test]
    fn test_allocate_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::open_or_create(dir.path(), "db").unwrap();

        let page_id = dm.allocate_new_page().unwrap();
        assert_eq!(page_id, PageId::new(0));

        let mut page = Page::new(page_id);
        page.add_record(b"payload").unwrap();
        dm.write_page(&page).unwrap();

        let read_back = dm.read_page(page_id).unwrap().unwrap();
        assert_eq!(read_back.records()[0], b"payload");
    }

    #[test]
    fn test_sequential_allocation() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::open_or_create(dir.path(), "db").unwrap();
        for i in 0..5 {
            let id = dm.allocate_new_page().unwrap();
            assert_eq!(id.0, i);
        }
        assert_eq!(dm.page_count().unwrap(), 5);
    }

    #[test]
    fn test_reopen_preserves_pages() {
        let dir = tempdir().unwrap();
        {
            let mut dm = DiskManager::open_or_create(dir.path(), "db").unwrap();
            let id = dm.allocate_new_page().unwrap();
            let mut page = Page::new(id);
            page.add_record(b"persisted").unwrap();
            dm.write_page(&page).unwrap();
        }
        {
            let mut dm = DiskManager::open_or_create(dir.path(), "db").unwrap();
            assert_eq!(dm.page_count().unwrap(), 1);
            let page = dm.read_page(PageId::new(0)).unwrap().unwrap();
            assert_eq!(page.records()[0], b"persisted");
        }
    }
}
