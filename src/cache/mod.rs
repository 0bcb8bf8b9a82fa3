//! Time-based cache for workspace datasets
//!
//! Each dataset (channels, emoji, users) is stored as one JSON document holding
//! the fetch timestamp and the full record list.
//!
//! Key features:
//! - Read-through: the fetch layer asks the store before calling Slack
//! - TTL-based freshness: 24-hour default (configurable)
//! - Whole-entry replacement via temp file + rename
//! - Unreadable files surface as `CacheCorruption` and are treated as misses

mod store;
mod types;

pub use store::{CacheStore, FileCacheStore};
pub use types::{CacheEntry, CacheStats, Dataset};
