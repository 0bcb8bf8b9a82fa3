//! Wire shapes of the Slack Web API responses we consume.
//!
//! Everything optional on Slack's side is defaulted here so that a missing
//! field never fails a whole page.

use crate::models::{ChannelId, ChannelRecord, UserRecord};
use crate::slack::types::ChannelInfo;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A response carrying one page of a cursor-paginated listing
pub trait Paginated {
    type Item;

    /// Split into the page items and the cursor of the next page, if any
    fn into_page(self) -> (Vec<Self::Item>, Option<String>);
}

fn next_cursor(metadata: Option<ResponseMetadata>) -> Option<String> {
    metadata
        .and_then(|m| m.next_cursor)
        .filter(|cursor| !cursor.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTextValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Seconds since epoch
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    /// Milliseconds since epoch
    #[serde(default)]
    pub updated: Option<i64>,
    #[serde(default)]
    pub num_members: Option<u64>,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub topic: Option<ApiTextValue>,
    #[serde(default)]
    pub purpose: Option<ApiTextValue>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ApiChannel {
    pub fn into_record(self) -> ChannelRecord {
        let updated_at = self.updated.and_then(DateTime::<Utc>::from_timestamp_millis);

        ChannelRecord {
            id: ChannelId::new(self.id),
            name: self.name,
            creator_id: non_empty(self.creator),
            creator: None,
            created_at: DateTime::<Utc>::from_timestamp(self.created, 0).unwrap_or_default(),
            archived: self.is_archived,
            archived_at: if self.is_archived { updated_at } else { None },
            updated_at,
            member_count: self.num_members.unwrap_or(0),
            topic: non_empty(self.topic.map(|t| t.value)),
            purpose: non_empty(self.purpose.map(|p| p.value)),
        }
    }

    pub fn into_info(self) -> ChannelInfo {
        ChannelInfo {
            id: self.id,
            name: self.name,
            is_member: self.is_member,
            is_private: self.is_private,
            is_archived: self.is_archived,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUserProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub profile: ApiUserProfile,
}

impl ApiUser {
    pub fn into_record(self) -> UserRecord {
        UserRecord {
            id: self.id,
            name: self.name,
            email: non_empty(self.profile.email),
            real_name: non_empty(self.profile.real_name).or(non_empty(self.real_name)),
            display_name: non_empty(self.profile.display_name),
            is_bot: self.is_bot,
            deleted: self.deleted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationsListResponse {
    #[serde(default)]
    pub channels: Vec<ApiChannel>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl Paginated for ConversationsListResponse {
    type Item = ApiChannel;

    fn into_page(self) -> (Vec<ApiChannel>, Option<String>) {
        (self.channels, next_cursor(self.response_metadata))
    }
}

#[derive(Debug, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub members: Vec<ApiUser>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl Paginated for UsersListResponse {
    type Item = ApiUser;

    fn into_page(self) -> (Vec<ApiUser>, Option<String>) {
        (self.members, next_cursor(self.response_metadata))
    }
}

#[derive(Debug, Deserialize)]
pub struct EmojiListResponse {
    /// Name to image URL or `alias:<target>`, sorted by name
    #[serde(default)]
    pub emoji: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationsInfoResponse {
    pub channel: ApiChannel,
}
