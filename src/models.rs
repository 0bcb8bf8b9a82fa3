//! Workspace records mirrored from Slack.
//!
//! These are snapshots: every refreshed fetch rebuilds them wholesale and they
//! are persisted as-is in the cache payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who created a channel, resolved against the users dataset when possible
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatorInfo {
    pub id: String,
    pub email: Option<String>,
    pub real_name: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: ChannelId,

    /// Channel name without # (e.g., "engineering")
    pub name: String,

    pub creator_id: Option<String>,

    #[serde(default)]
    pub creator: Option<CreatorInfo>,

    pub created_at: DateTime<Utc>,

    pub archived: bool,

    /// Last update time of an archived channel; Slack stamps it on archive
    pub archived_at: Option<DateTime<Utc>>,

    /// Raw `updated` stamp, kept for display/export of active channels too
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    pub member_count: u64,

    #[serde(default)]
    pub topic: Option<String>,

    #[serde(default)]
    pub purpose: Option<String>,
}

impl ChannelRecord {
    /// Get display name with # prefix
    pub fn display_name(&self) -> String {
        format!("#{}", self.name)
    }

    pub fn status(&self) -> &'static str {
        if self.archived { "archived" } else { "active" }
    }

    pub fn creator_email(&self) -> Option<&str> {
        self.creator.as_ref().and_then(|c| c.email.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiRecord {
    pub name: String,

    /// Direct image URL; `None` for aliases
    pub url: Option<String>,

    pub is_alias: bool,

    /// Emoji this alias points to (e.g. "thumbsup")
    pub alias_target: Option<String>,
}

impl EmojiRecord {
    const ALIAS_PREFIX: &'static str = "alias:";

    /// Build a record from one `emoji.list` entry, where the value is either an
    /// image URL or `alias:<target>`.
    pub fn from_listing(name: impl Into<String>, value: &str) -> Self {
        match value.strip_prefix(Self::ALIAS_PREFIX) {
            Some(target) => Self {
                name: name.into(),
                url: None,
                is_alias: true,
                alias_target: Some(target.to_string()),
            },
            None => Self {
                name: name.into(),
                url: Some(value.to_string()),
                is_alias: false,
                alias_target: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User ID (e.g., U09JDBT2MCM)
    pub id: String,

    /// Username/handle (e.g., "john.doe")
    pub name: String,

    pub email: Option<String>,

    pub real_name: Option<String>,

    pub display_name: Option<String>,

    pub is_bot: bool,

    #[serde(default)]
    pub deleted: bool,
}

impl UserRecord {
    pub fn to_creator(&self) -> CreatorInfo {
        CreatorInfo {
            id: self.id.clone(),
            email: self.email.clone(),
            real_name: self.real_name.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(display_name: Option<&str>, real_name: Option<&str>) -> UserRecord {
        UserRecord {
            id: "U123".to_string(),
            name: "john.doe".to_string(),
            email: Some("john@example.com".to_string()),
            real_name: real_name.map(str::to_string),
            display_name: display_name.map(str::to_string),
            is_bot: false,
            deleted: false,
        }
    }

    #[test]
    fn test_emoji_from_url_listing() {
        let emoji = EmojiRecord::from_listing(
            "party-parrot",
            "https://emoji.slack-edge.com/T1/party-parrot/abc.gif",
        );
        assert!(!emoji.is_alias);
        assert_eq!(
            emoji.url.as_deref(),
            Some("https://emoji.slack-edge.com/T1/party-parrot/abc.gif")
        );
        assert!(emoji.alias_target.is_none());
    }

    #[test]
    fn test_emoji_from_alias_listing() {
        let emoji = EmojiRecord::from_listing("thumbs", "alias:thumbsup");
        assert!(emoji.is_alias);
        assert!(emoji.url.is_none());
        assert_eq!(emoji.alias_target.as_deref(), Some("thumbsup"));
    }

    #[test]
    fn test_user_to_creator() {
        let creator = user(Some("Johnny"), None).to_creator();
        assert_eq!(creator.id, "U123");
        assert_eq!(creator.email.as_deref(), Some("john@example.com"));
        assert_eq!(creator.display_name.as_deref(), Some("Johnny"));
    }

    #[test]
    fn test_channel_display_and_status() {
        let channel = ChannelRecord {
            id: ChannelId::new("C123"),
            name: "engineering".to_string(),
            creator_id: None,
            creator: None,
            created_at: Utc::now(),
            archived: true,
            archived_at: None,
            updated_at: None,
            member_count: 0,
            topic: None,
            purpose: None,
        };
        assert_eq!(channel.display_name(), "#engineering");
        assert_eq!(channel.status(), "archived");
        assert_eq!(channel.id.to_string(), "C123");
    }
}
