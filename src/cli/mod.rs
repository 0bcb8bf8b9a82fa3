//! Command-line surface: argument parsing, command dispatch and rendering.
//!
//! ```text
//! slack-migrate channels fetch --type archived --archived-days-ago 30
//! cat ids.txt | slack-migrate channels archive --dry-run
//! slack-migrate channels prefix old C01234ABCDE
//! slack-migrate emoji download --refresh
//! slack-migrate users fetch --csv
//! ```

mod commands;
pub mod output;

pub use commands::{App, RunStatus};

use crate::fetch::{ChannelFilter, ChannelStatus, CreatorMatch};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fetch, filter and bulk-edit Slack workspace metadata.
#[derive(Debug, Parser)]
#[command(name = "slack-migrate", version, about)]
pub struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for cached datasets (overrides SLACK_MIGRATE_CACHE_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory for CSV exports and downloads (overrides SLACK_MIGRATE_DATA_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Public channels.
    Channels {
        #[command(subcommand)]
        action: ChannelsCmd,
    },

    /// Custom emoji.
    Emoji {
        #[command(subcommand)]
        action: EmojiCmd,
    },

    /// Workspace members.
    Users {
        #[command(subcommand)]
        action: UsersCmd,
    },
}

#[derive(Debug, Subcommand)]
pub enum ChannelsCmd {
    /// List channels, optionally filtered.
    Fetch(ChannelFetchArgs),

    /// Archive channels given as an argument or one ID per line on stdin.
    Archive {
        /// Channel ID; read from stdin when omitted.
        channel_id: Option<String>,

        /// Show what would be archived without calling Slack.
        #[arg(long)]
        dry_run: bool,
    },

    /// Rename channels to `{prefix}-{name}`.
    Prefix {
        /// Prefix without `#` (a trailing `-` is dropped).
        prefix: String,

        /// Channel ID; read from stdin when omitted.
        channel_id: Option<String>,

        /// Show the renames without performing them.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ChannelFetchArgs {
    /// Which channels to return.
    #[arg(long = "type", value_enum, default_value_t = TypeArg::All)]
    pub channel_type: TypeArg,

    /// Ignore the cache and fetch from Slack.
    #[arg(long)]
    pub refresh: bool,

    /// Channel creator, as a user ID or an email address.
    #[arg(long)]
    pub creator: Option<String>,

    /// Only channels archived at most this many days ago (0 disables).
    #[arg(long, value_name = "DAYS")]
    pub archived_days_ago: Option<u32>,

    /// Only channels created at most this many days ago (0 disables).
    #[arg(long, value_name = "DAYS")]
    pub created_days_ago: Option<u32>,

    /// Only channels with no members.
    #[arg(long)]
    pub zero_members: bool,

    /// Write the result to channels.csv in the data directory.
    #[arg(long)]
    pub csv: bool,
}

impl ChannelFetchArgs {
    pub fn filter(&self) -> ChannelFilter {
        ChannelFilter {
            status: self.channel_type.into(),
            creator: self.creator.as_deref().map(CreatorMatch::parse),
            archived_within_days: self.archived_days_ago,
            created_within_days: self.created_days_ago,
            zero_members: self.zero_members,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    #[default]
    All,
    Active,
    Archived,
}

impl From<TypeArg> for ChannelStatus {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::All => ChannelStatus::All,
            TypeArg::Active => ChannelStatus::Active,
            TypeArg::Archived => ChannelStatus::Archived,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum EmojiCmd {
    /// List custom emoji names.
    Fetch {
        #[arg(long)]
        refresh: bool,
    },

    /// Download emoji images into the data directory.
    Download {
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum UsersCmd {
    /// List workspace members.
    Fetch {
        #[arg(long)]
        refresh: bool,

        /// Write the result to users.csv in the data directory.
        #[arg(long)]
        csv: bool,
    },
}
