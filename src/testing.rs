//! In-memory `SlackApi` that records every call

use crate::error::{Result, SlackMigrateError};
use crate::models::{ChannelId, ChannelRecord, EmojiRecord, UserRecord};
use crate::slack::{Actor, ChannelInfo, SlackApi};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct FakeSlack {
    pub channels: Mutex<Vec<ChannelRecord>>,
    pub users: Vec<UserRecord>,
    pub emoji: Vec<EmojiRecord>,
    /// Channel ID to (name, is_member, is_private)
    pub info: HashMap<String, (String, bool, bool)>,
    pub failing: HashSet<String>,
    pub revoked: bool,
    pub files: HashMap<String, Vec<u8>>,
    /// Held inside `download` so overlapping downloads show in `max_in_flight`
    pub download_delay: Option<Duration>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSlack {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.starts_with("join") || c.starts_with("archive") || c.starts_with("rename")
            })
            .collect()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.revoked {
            return Err(SlackMigrateError::Auth("token_revoked".to_string()));
        }
        Ok(())
    }

    fn check_failing(&self, method: &str, channel: &ChannelId) -> Result<()> {
        if self.failing.contains(channel.as_str()) {
            return Err(SlackMigrateError::api(method, "channel_not_found"));
        }
        Ok(())
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn list_channels(&self) -> Result<Vec<ChannelRecord>> {
        self.record("list_channels".to_string())?;
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.record("list_users".to_string())?;
        Ok(self.users.clone())
    }

    async fn list_emoji(&self) -> Result<Vec<EmojiRecord>> {
        self.record("list_emoji".to_string())?;
        Ok(self.emoji.clone())
    }

    async fn channel_info(&self, channel: &ChannelId, actor: Actor) -> Result<ChannelInfo> {
        self.record(format!("info {channel} {actor:?}"))?;
        self.check_failing("conversations.info", channel)?;
        let (name, is_member, is_private) = self
            .info
            .get(channel.as_str())
            .cloned()
            .unwrap_or_else(|| (channel.as_str().to_lowercase(), true, false));
        Ok(ChannelInfo {
            id: channel.to_string(),
            name,
            is_member,
            is_private,
            is_archived: false,
        })
    }

    async fn join_channel(&self, channel: &ChannelId, actor: Actor) -> Result<()> {
        self.record(format!("join {channel} {actor:?}"))
    }

    async fn archive_channel(&self, channel: &ChannelId) -> Result<()> {
        self.record(format!("archive {channel}"))?;
        self.check_failing("conversations.archive", channel)
    }

    async fn rename_channel(&self, channel: &ChannelId, new_name: &str) -> Result<()> {
        self.record(format!("rename {channel} {new_name}"))?;
        self.check_failing("conversations.rename", channel)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.record(format!("download {url}"))?;
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.download_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| SlackMigrateError::api("download", "HTTP 404 Not Found"))
    }
}
