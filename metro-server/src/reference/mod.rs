//! Reference data: stations, directions and holidays.
//!
//! These tables are small and effectively static, so they are read once
//! and kept for the life of the process, backed by a persistent
//! key-value cache that survives restarts.

mod cache;
mod kv;

pub use cache::{ReferenceCache, ReferenceKey};
pub use kv::{FileKvStore, KeyValueStore, KvError, MemoryKvStore};
