//! Flat `key = value` configuration, in the spirit of a Java
//! `.properties` file: one entry per line, `#`-prefixed comments
//! skipped, unknown keys ignored, missing keys fall back to defaults.

use std::fs;
use std::path::Path;

use crate::common::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub buffer_pool_size: usize,
    pub max_connections: usize,
    pub log_level: String,
    pub data_directory: String,
    pub page_size: usize,
    pub enable_wal: bool,
    pub wal_sync_interval: u64,
    pub auto_create_indexes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            buffer_pool_size: 1000,
            max_connections: 100,
            log_level: "INFO".to_string(),
            data_directory: "./data".to_string(),
            page_size: 4096,
            enable_wal: true,
            wal_sync_interval: 1000,
            auto_create_indexes: true,
        }
    }
}

impl EngineConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_str(&text))
    }

    pub fn from_str(text: &str) -> Self {
        let mut config = EngineConfig::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "buffer.pool.size" => {
                    if let Ok(v) = value.parse() {
                        config.buffer_pool_size = v;
                    }
                }
                "max.connections" => {
                    if let Ok(v) = value.parse() {
                        config.max_connections = v;
                    }
                }
                "log.level" => config.log_level = value.to_string(),
                "data.directory" => config.data_directory = value.to_string(),
                "page.size" => {
                    if let Ok(v) = value.parse() {
                        config.page_size = v;
                    }
                }
                "enable.wal" => {
                    if let Ok(v) = value.parse() {
                        config.enable_wal = v;
                    }
                }
                "wal.sync.interval" => {
                    if let Ok(v) = value.parse() {
                        config.wal_sync_interval = v;
                    }
                }
                "auto.create.indexes" => {
                    if let Ok(v) = value.parse() {
                        config.auto_create_indexes = v;
                    }
                }
                _ => {}
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.buffer_pool_size, 1000);
        assert_eq!(config.log_level, "INFO");
        assert!(config.enable_wal);
    }

    #[test]
    fn test_parses_overrides_and_skips_comments() {
        let text = "\
# a comment
buffer.pool.size = 250
log.level=DEBUG
enable.wal = false
unknown.key = whatever
";
        let config = EngineConfig::from_str(text);
        assert_eq!(config.buffer_pool_size, 250);
        assert_eq!(config.log_level, "DEBUG");
        assert!(!config.enable_wal);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config = EngineConfig::from_str("log.level=WARN\n");
        assert_eq!(config.log_level, "WARN");
        assert_eq!(config.max_connections, 100);
    }
}
