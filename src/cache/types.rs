//! Cache entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Unit of caching: one file per dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Channels,
    Emoji,
    Users,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Channels => "channels",
            Dataset::Emoji => "emoji",
            Dataset::Users => "users",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted dataset snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub dataset: Dataset,
    pub fetched_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl CacheEntry {
    pub fn new(dataset: Dataset, payload: serde_json::Value) -> Self {
        Self {
            dataset,
            fetched_at: Utc::now(),
            payload,
        }
    }

    /// Age at `now`; entries stamped in the future count as brand new
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Fresh while strictly younger than the TTL
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Entries found but older than the requested max age
    pub stale: u64,
    pub corrupt: u64,
}
