//! Read-through fetching of workspace datasets.
//!
//! Each dataset is served from the cache while it is fresh, unless the caller
//! forces a refresh. A refresh replaces the cached payload wholesale.

mod filter;

pub use filter::{ChannelFilter, ChannelStatus, CreatorMatch};

use crate::cache::{CacheStore, Dataset};
use crate::error::{Result, SlackMigrateError};
use crate::logging::Timer;
use crate::models::{ChannelRecord, CreatorInfo, EmojiRecord, UserRecord};
use crate::slack::SlackApi;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Where fetched records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Slack,
}

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub records: Vec<T>,
    pub source: FetchSource,
    pub fetched_at: DateTime<Utc>,
}

pub struct Fetcher {
    api: Arc<dyn SlackApi>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl Fetcher {
    pub fn new(api: Arc<dyn SlackApi>, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { api, cache, ttl }
    }

    /// All public channels, with creators resolved against the users dataset
    pub async fn channels(&self, refresh: bool) -> Result<Fetched<ChannelRecord>> {
        if let Some(cached) = self.cached(Dataset::Channels, refresh).await {
            return Ok(cached);
        }

        let _timer = Timer::new("fetch_channels");
        let mut channels = self.api.list_channels().await?;

        // Creator lookup goes through the users cache; only channels are forced
        let users = self.users(false).await?;
        enrich_creators(&mut channels, &users.records);

        self.store(Dataset::Channels, channels).await
    }

    pub async fn users(&self, refresh: bool) -> Result<Fetched<UserRecord>> {
        if let Some(cached) = self.cached(Dataset::Users, refresh).await {
            return Ok(cached);
        }

        let _timer = Timer::new("fetch_users");
        let users = self.api.list_users().await?;
        self.store(Dataset::Users, users).await
    }

    pub async fn emoji(&self, refresh: bool) -> Result<Fetched<EmojiRecord>> {
        if let Some(cached) = self.cached(Dataset::Emoji, refresh).await {
            return Ok(cached);
        }

        let _timer = Timer::new("fetch_emoji");
        let emoji = self.api.list_emoji().await?;
        self.store(Dataset::Emoji, emoji).await
    }

    /// Fresh cached records, or `None` when Slack has to be asked.
    ///
    /// Stale, unreadable or undecodable entries are treated as a miss.
    async fn cached<T>(&self, dataset: Dataset, refresh: bool) -> Option<Fetched<T>>
    where
        T: DeserializeOwned,
    {
        if refresh {
            tracing::debug!(dataset = %dataset, "Refresh requested, bypassing cache");
            return None;
        }

        let entry = match self.cache.read(dataset, self.ttl).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::debug!(dataset = %dataset, "No fresh cache entry");
                return None;
            }
            Err(e) => {
                tracing::warn!(dataset = %dataset, error = %e, "Ignoring unreadable cache");
                return None;
            }
        };

        match serde_json::from_value::<Vec<T>>(entry.payload) {
            Ok(records) => {
                tracing::debug!(dataset = %dataset, count = records.len(), "Cache hit");
                Some(Fetched {
                    records,
                    source: FetchSource::Cache,
                    fetched_at: entry.fetched_at,
                })
            }
            Err(e) => {
                let err = SlackMigrateError::CacheCorruption {
                    dataset: dataset.to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!(dataset = %dataset, error = %err, "Ignoring unreadable cache");
                None
            }
        }
    }

    async fn store<T>(&self, dataset: Dataset, records: Vec<T>) -> Result<Fetched<T>>
    where
        T: Serialize,
    {
        let payload = serde_json::to_value(&records)?;
        let entry = self.cache.write(dataset, payload).await?;

        tracing::info!(dataset = %dataset, count = records.len(), "Cached fresh records");
        Ok(Fetched {
            records,
            source: FetchSource::Slack,
            fetched_at: entry.fetched_at,
        })
    }
}

/// Attach creator details from `users`; unknown creators keep only their ID
pub fn enrich_creators(channels: &mut [ChannelRecord], users: &[UserRecord]) {
    let by_id: HashMap<&str, &UserRecord> = users.iter().map(|u| (u.id.as_str(), u)).collect();

    for channel in channels.iter_mut() {
        channel.creator = channel.creator_id.as_deref().map(|id| match by_id.get(id) {
            Some(user) => user.to_creator(),
            None => CreatorInfo {
                id: id.to_string(),
                ..Default::default()
            },
        });
    }
}
