//! Background audit-log writer: a bounded grace-period drain over an
//! unbounded channel, consumed by one dedicated thread per engine.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{unbounded, Sender};
use log::error;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// One audit record: operation, table, raw SQL text (newlines
/// stripped), and outcome.
pub struct AuditEntry {
    pub operation: String,
    pub table: String,
    pub user: String,
    pub sql: String,
    pub success: bool,
    pub error: String,
}

impl AuditEntry {
    fn to_line(&self) -> String {
        let sql = self.sql.replace('\n', " ").replace('\r', " ");
        let status = if self.success { "SUCCESS" } else { "FAILURE" };
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            Utc::now().to_rfc3339(),
            self.operation,
            self.table,
            self.user,
            status,
            sql,
            self.error
        )
    }
}

enum Message {
    Entry(AuditEntry),
    Shutdown,
}

/// Owns the background thread that appends audit entries to
/// `<dir>/audit.log`. Dropping or calling [`AuditLogger::shutdown`]
/// signals the thread to drain and exit within a bounded grace period.
pub struct AuditLogger {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl AuditLogger {
    pub fn start<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let path: PathBuf = dir.as_ref().join("audit.log");
        std::fs::create_dir_all(dir.as_ref())?;
        let mut file: File = OpenOptions::new().create(true).append(true).open(&path)?;

        let (sender, receiver) = unbounded::<Message>();
        let handle = thread::spawn(move || loop {
            match receiver.recv_timeout(SHUTDOWN_GRACE) {
                Ok(Message::Entry(entry)) => {
                    if let Err(e) = writeln!(file, "{}", entry.to_line()) {
                        error!("audit log write failed: {e}");
                    }
                }
                Ok(Message::Shutdown) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    while let Ok(Message::Entry(entry)) = receiver.try_recv() {
                        let _ = writeln!(file, "{}", entry.to_line());
                    }
                    break;
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            }
        });

        Ok(AuditLogger {
            sender,
            handle: Some(handle),
        })
    }

    /// Enqueue an entry; never blocks the caller on disk I/O.
    pub fn log(&self, entry: AuditEntry) {
        let _ = self.sender.send(Message::Entry(entry));
    }

    pub fn shutdown(&mut self) {
        let _ = self.sender.send(Message::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AuditLogger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;

    #[test]
    fn test_writes_line_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = AuditLogger::start(dir.path()).unwrap();
        logger.log(AuditEntry {
            operation: "INSERT".to_string(),
            table: "users".to_string(),
            user: "system".to_string(),
            sql: "INSERT INTO users (id) VALUES (1)".to_string(),
            success: true,
            error: String::new(),
        });
        logger.shutdown();

        let contents = fs::read_to_string(dir.path().join("audit.log")).unwrap();
        assert!(contents.contains("INSERT"));
        assert!(contents.contains("users"));
        assert!(contents.contains("SUCCESS"));
    }

    #[test]
    fn test_newlines_stripped_from_sql() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = AuditLogger::start(dir.path()).unwrap();
        logger.log(AuditEntry {
            operation: "UPDATE".to_string(),
            table: "t".to_string(),
            user: "system".to_string(),
            sql: "UPDATE t\nSET x = 1".to_string(),
            success: false,
            error: "boom".to_string(),
        });
        logger.shutdown();
        sleep(Duration::from_millis(10));

        let contents = fs::read_to_string(dir.path().join("audit.log")).unwrap();
        assert!(!contents.trim_end().contains('\n'));
        assert!(contents.contains("FAILURE"));
        assert!(contents.contains("boom"));
    }
}
