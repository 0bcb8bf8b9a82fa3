use crate::error::Result;
use crate::models::{ChannelId, ChannelRecord, EmojiRecord, UserRecord};
use crate::slack::types::{Actor, ChannelInfo};
use async_trait::async_trait;

/// Operations this tool needs from Slack.
///
/// Listing calls return the complete record set (all pages). Mutating calls
/// surface Slack's own error codes (`already_archived`, `name_taken`, ...) as
/// `SlackMigrateError::Api`.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `conversations.list` for public channels, archived included
    async fn list_channels(&self) -> Result<Vec<ChannelRecord>>;

    /// `users.list`
    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    /// `emoji.list`, sorted by name
    async fn list_emoji(&self) -> Result<Vec<EmojiRecord>>;

    /// `conversations.info`, membership relative to `actor`
    async fn channel_info(&self, channel: &ChannelId, actor: Actor) -> Result<ChannelInfo>;

    /// `conversations.join`
    async fn join_channel(&self, channel: &ChannelId, actor: Actor) -> Result<()>;

    /// `conversations.archive` with the bot token
    async fn archive_channel(&self, channel: &ChannelId) -> Result<()>;

    /// `conversations.rename` with the admin token
    async fn rename_channel(&self, channel: &ChannelId, new_name: &str) -> Result<()>;

    /// Fetch a file body (emoji images live on a public CDN)
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
