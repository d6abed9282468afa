//! Shared RocksDB storage utilities.
//!
//! Generic helpers for RocksDB-backed storage. Nothing in here knows about
//! questions or answers; the domain layout lives in `qa::storage`.
//!
//! ## Key Features
//!
//! - Configurable RocksDB setup with sensible defaults
//! - Typed key-value operations with bincode serialization
//! - Prefix iteration and counting
//! - Atomic write batches spanning several column families

use crate::error::{EurekaError, Result};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
    WriteBatch,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// =============================================================================
// RocksDB Configuration
// =============================================================================

/// Configuration for RocksDB storage.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Maximum number of open files.
    pub max_open_files: i32,
    /// Number of log files to keep.
    pub keep_log_file_num: usize,
    /// Maximum WAL size in bytes.
    pub max_wal_size: u64,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// Maximum number of write buffers.
    pub max_write_buffer_number: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            max_open_files: 128,
            keep_log_file_num: 2,
            max_wal_size: 16 * 1024 * 1024,      // 16MB
            write_buffer_size: 8 * 1024 * 1024, // 8MB
            max_write_buffer_number: 2,
        }
    }
}

impl RocksDbConfig {
    /// Creates a configuration for the long-running server.
    ///
    /// Uses larger buffers and more files for higher throughput.
    pub fn for_server() -> Self {
        Self {
            max_open_files: 256,
            keep_log_file_num: 3,
            max_wal_size: 64 * 1024 * 1024,       // 64MB
            write_buffer_size: 32 * 1024 * 1024, // 32MB
            max_write_buffer_number: 3,
        }
    }

    /// Builds RocksDB Options from this configuration.
    pub fn build_options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(self.max_open_files);
        opts.set_keep_log_file_num(self.keep_log_file_num);
        opts.set_max_total_wal_size(self.max_wal_size);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_max_write_buffer_number(self.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }
}

// =============================================================================
// Key Generation Utilities
// =============================================================================

/// Creates a prefixed key with a separator.
///
/// Format: `{prefix}{separator}{suffix}`
pub fn prefixed_key(prefix: &[u8], separator: u8, suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + 1 + suffix.len());
    key.extend_from_slice(prefix);
    key.push(separator);
    key.extend_from_slice(suffix);
    key
}

/// Creates a composite key from two byte slices.
///
/// Format: `{part1}:{part2}` (using colon separator)
pub fn composite_key(part1: &[u8], part2: &[u8]) -> Vec<u8> {
    prefixed_key(part1, b':', part2)
}

/// Encodes a millisecond timestamp so that newer values sort first.
///
/// RocksDB orders keys by ascending bytes, so `u64::MAX - timestamp` in
/// big-endian makes the newest entry the first one a prefix scan sees.
pub fn newest_first(timestamp_millis: u64) -> [u8; 8] {
    (u64::MAX - timestamp_millis).to_be_bytes()
}

/// Encodes a millisecond timestamp so that older values sort first.
pub fn oldest_first(timestamp_millis: u64) -> [u8; 8] {
    timestamp_millis.to_be_bytes()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value)
        .map_err(|e| EurekaError::serialization(format!("Failed to serialize: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| EurekaError::serialization(format!("Failed to deserialize: {}", e)))
}

// =============================================================================
// Database Handle Wrapper
// =============================================================================

/// A wrapper around RocksDB that provides common operations.
///
/// Embedded in domain storage structs, which add their own key layout on top.
pub struct RocksDbHandle {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksDbHandle {
    /// Opens a RocksDB database with the given column families.
    pub fn open(
        db_path: impl AsRef<Path>,
        config: &RocksDbConfig,
        column_families: &[&str],
    ) -> Result<Self> {
        let opts = config.build_options();
        let cf_opts = Options::default();

        let cf_descriptors: Vec<_> = column_families
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(*cf, cf_opts.clone()))
            .collect();

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(
            &opts,
            db_path.as_ref(),
            cf_descriptors,
        )
        .map_err(|e| EurekaError::storage(format!("Failed to open RocksDB: {}", e)))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Gets a column family handle.
    pub fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| EurekaError::storage(format!("Column family '{}' not found", name)))
    }

    /// Stores a serializable value at the given key.
    pub fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = encode(value)?;
        self.put_raw(cf_name, key, &bytes)
    }

    /// Stores raw bytes at the given key.
    pub fn put_raw(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;

        trace!(
            cf = cf_name,
            key_len = key.len(),
            value_bytes = value.len(),
            "db_put: storing value"
        );

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| EurekaError::storage(format!("Failed to write: {}", e)))
    }

    /// Loads and deserializes a value from the given key.
    pub fn get<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        match self.get_raw(cf_name, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Loads raw bytes from the given key.
    pub fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;

        match self.db.get_cf(&cf, key) {
            Ok(Some(bytes)) => {
                trace!(
                    cf = cf_name,
                    key_len = key.len(),
                    value_bytes = bytes.len(),
                    "db_get: found record"
                );
                Ok(Some(bytes))
            }
            Ok(None) => {
                trace!(cf = cf_name, key_len = key.len(), "db_get: key not found");
                Ok(None)
            }
            Err(e) => Err(EurekaError::storage(format!("Failed to read: {}", e))),
        }
    }

    /// Checks if a key exists.
    pub fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        let exists = self
            .db
            .get_pinned_cf(&cf, key)
            .map(|v| v.is_some())
            .map_err(|e| EurekaError::storage(format!("Failed to check key: {}", e)))?;

        trace!(
            cf = cf_name,
            key_len = key.len(),
            exists = exists,
            "db_exists: checked key existence"
        );

        Ok(exists)
    }

    /// Iterates over all entries with the given prefix.
    ///
    /// The callback receives (key, value) pairs and returns true to continue
    /// or false to stop.
    pub fn prefix_iterate<F>(&self, cf_name: &str, prefix: &[u8], mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> bool,
    {
        let cf = self.cf(cf_name)?;
        let iter = self.db.prefix_iterator_cf(&cf, prefix);

        let mut count: usize = 0;
        for item in iter {
            match item {
                Ok((key, value)) => {
                    if !key.starts_with(prefix) {
                        break;
                    }
                    count += 1;
                    if !callback(&key, &value) {
                        break;
                    }
                }
                Err(e) => {
                    return Err(EurekaError::storage(format!("Iterator error: {}", e)));
                }
            }
        }

        debug!(
            cf = cf_name,
            prefix_len = prefix.len(),
            records_iterated = count,
            "db_prefix_iterate: completed iteration"
        );

        Ok(())
    }

    /// Collects the values stored under a prefix as UTF-8 strings.
    ///
    /// Index column families store entity ids as their values, so this is
    /// the common way to read an index range. Stops after `limit` entries
    /// when one is given.
    pub fn prefix_values(
        &self,
        cf_name: &str,
        prefix: &[u8],
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let mut values = Vec::new();
        self.prefix_iterate(cf_name, prefix, |_, value| {
            match std::str::from_utf8(value) {
                Ok(s) => values.push(s.to_string()),
                Err(e) => warn!(cf = cf_name, "Skipping non UTF-8 index value: {}", e),
            }
            limit.map_or(true, |max| values.len() < max)
        })?;
        Ok(values)
    }

    /// Counts the entries stored under a prefix.
    pub fn prefix_count(&self, cf_name: &str, prefix: &[u8]) -> Result<usize> {
        let mut count = 0;
        self.prefix_iterate(cf_name, prefix, |_, _| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    /// Starts a new atomic write batch.
    pub fn batch(&self) -> StoreBatch<'_> {
        StoreBatch {
            handle: self,
            inner: WriteBatch::default(),
        }
    }
}

impl std::fmt::Debug for RocksDbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbHandle")
            .field("db", &"RocksDB")
            .finish()
    }
}

// =============================================================================
// Write Batches
// =============================================================================

/// A set of writes applied to the database in one atomic step.
///
/// Nothing becomes visible until [`StoreBatch::commit`] succeeds; dropping an
/// uncommitted batch discards it.
pub struct StoreBatch<'a> {
    handle: &'a RocksDbHandle,
    inner: WriteBatch,
}

impl StoreBatch<'_> {
    /// Queues a serializable value.
    pub fn put<T: Serialize>(&mut self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = encode(value)?;
        self.put_raw(cf_name, key, &bytes)
    }

    /// Queues raw bytes.
    pub fn put_raw(&mut self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.handle.cf(cf_name)?;
        self.inner.put_cf(&cf, key, value);
        Ok(())
    }

    /// Queues a deletion.
    pub fn delete(&mut self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self.handle.cf(cf_name)?;
        self.inner.delete_cf(&cf, key);
        Ok(())
    }

    /// Applies every queued operation atomically.
    pub fn commit(self) -> Result<()> {
        let operations = self.inner.len();
        self.handle
            .db
            .write(self.inner)
            .map_err(|e| EurekaError::storage(format!("Failed to commit batch: {}", e)))?;

        debug!(operations, "db_batch: committed write batch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: u64,
    }

    fn create_test_db() -> (RocksDbHandle, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test_db");
        let config = RocksDbConfig::default();
        let db =
            RocksDbHandle::open(&db_path, &config, &["data", "idx"]).expect("Failed to open db");
        (db, temp_dir)
    }

    #[test]
    fn test_composite_key() {
        let key = composite_key(b"part1", b"part2");
        assert_eq!(key, b"part1:part2");
    }

    #[test]
    fn test_newest_first_ordering() {
        assert!(newest_first(2_000) < newest_first(1_000));
        assert!(oldest_first(1_000) < oldest_first(2_000));
    }

    #[test]
    fn test_put_and_get() {
        let (db, _temp) = create_test_db();

        let data = TestData {
            name: "Test".to_string(),
            value: 12345,
        };

        db.put("data", b"key1", &data).unwrap();

        let loaded: TestData = db.get("data", b"key1").unwrap().unwrap();
        assert_eq!(loaded, data);
        assert!(db.exists("data", b"key1").unwrap());
    }

    #[test]
    fn test_get_missing_key() {
        let (db, _temp) = create_test_db();
        let result: Option<TestData> = db.get("data", b"nonexistent").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_prefix_values_in_key_order() {
        let (db, _temp) = create_test_db();

        let mut older = b"q1:".to_vec();
        older.extend_from_slice(&newest_first(1_000));
        let mut newer = b"q1:".to_vec();
        newer.extend_from_slice(&newest_first(2_000));

        db.put_raw("idx", &older, b"older").unwrap();
        db.put_raw("idx", &newer, b"newer").unwrap();
        db.put_raw("idx", b"q2:x", b"other").unwrap();

        let values = db.prefix_values("idx", b"q1:", None).unwrap();
        assert_eq!(values, vec!["newer".to_string(), "older".to_string()]);

        let limited = db.prefix_values("idx", b"q1:", Some(1)).unwrap();
        assert_eq!(limited, vec!["newer".to_string()]);

        assert_eq!(db.prefix_count("idx", b"q1:").unwrap(), 2);
        assert_eq!(db.prefix_count("idx", b"q3:").unwrap(), 0);
    }

    #[test]
    fn test_batch_is_atomic_across_column_families() {
        let (db, _temp) = create_test_db();
        db.put_raw("idx", b"stale", b"1").unwrap();

        let mut batch = db.batch();
        batch
            .put(
                "data",
                b"key",
                &TestData {
                    name: "batched".to_string(),
                    value: 7,
                },
            )
            .unwrap();
        batch.put_raw("idx", b"fresh", b"1").unwrap();
        batch.delete("idx", b"stale").unwrap();

        // Nothing is visible before commit
        assert!(!db.exists("data", b"key").unwrap());

        batch.commit().unwrap();

        assert!(db.exists("data", b"key").unwrap());
        assert!(db.exists("idx", b"fresh").unwrap());
        assert!(!db.exists("idx", b"stale").unwrap());
    }

    #[test]
    fn test_dropped_batch_writes_nothing() {
        let (db, _temp) = create_test_db();
        {
            let mut batch = db.batch();
            batch.put_raw("data", b"key", b"value").unwrap();
        }
        assert!(!db.exists("data", b"key").unwrap());
    }

    #[test]
    fn test_server_config() {
        let config = RocksDbConfig::for_server();
        assert_eq!(config.max_open_files, 256);
        assert_eq!(config.max_wal_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_unknown_column_family() {
        let (db, _temp) = create_test_db();
        let err = db.put_raw("missing", b"k", b"v").unwrap_err();
        assert!(matches!(err, EurekaError::Storage(_)));
    }
}
