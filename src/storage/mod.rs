//! Storage utilities and abstractions.
//!
//! ## Modules
//!
//! - `rocksdb`: Generic RocksDB utilities (configuration, handle, iteration, batches)

pub mod rocksdb;

pub use rocksdb::{
    composite_key, newest_first, oldest_first, prefixed_key, RocksDbConfig, RocksDbHandle,
    StoreBatch,
};
