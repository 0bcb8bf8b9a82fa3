/// Which credential a call is made with.
///
/// `Admin` uses `SLACK_USER_TOKEN` when configured and falls back to the bot
/// token otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Bot,
    Admin,
}

/// Subset of `conversations.info` needed before mutating a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub is_member: bool,
    pub is_private: bool,
    pub is_archived: bool,
}
