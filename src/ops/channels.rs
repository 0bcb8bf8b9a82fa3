//! Archive and prefix-rename batches.
//!
//! A batch is planned first and then either previewed (dry run) or executed.
//! Planning never mutates anything, so the preview and the real run work from
//! the same action list. Item failures are collected and the batch carries
//! on; an authentication failure aborts it.

use crate::error::{Result, SlackMigrateError};
use crate::logging::Timer;
use crate::models::ChannelId;
use crate::slack::{Actor, SlackApi};
use regex::Regex;
use std::fmt;
use std::io::BufRead;
use std::sync::{Arc, LazyLock};

/// Slack's limit on channel name length
pub const MAX_CHANNEL_NAME_LEN: usize = 80;

static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("prefix pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    Archive {
        channel: ChannelId,
    },
    Rename {
        channel: ChannelId,
        from: String,
        to: String,
    },
}

impl ChannelAction {
    pub fn channel(&self) -> &ChannelId {
        match self {
            ChannelAction::Archive { channel } | ChannelAction::Rename { channel, .. } => channel,
        }
    }

    /// Token the mutation (and any join it needs) is made with
    fn actor(&self) -> Actor {
        match self {
            ChannelAction::Archive { .. } => Actor::Bot,
            ChannelAction::Rename { .. } => Actor::Admin,
        }
    }
}

impl fmt::Display for ChannelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelAction::Archive { channel } => write!(f, "archive {channel}"),
            ChannelAction::Rename { channel, from, to } => {
                write!(f, "rename {channel} #{from} -> #{to}")
            }
        }
    }
}

/// Channel left untouched because it already carries the prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub channel: ChannelId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub channel: ChannelId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub actions: Vec<ChannelAction>,
    pub skipped: Vec<Skipped>,
    /// Channels that could not be planned (info lookup failed, name too long)
    pub failed: Vec<ItemFailure>,
}

impl BatchPlan {
    /// One line per action, exactly what a real run would perform
    pub fn preview(&self) -> Vec<String> {
        self.actions.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<ChannelAction>,
    pub skipped: Vec<Skipped>,
    pub failed: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Channel IDs from the positional argument, or one per line from `input`.
///
/// Lines are trimmed and blank lines ignored.
pub fn channel_ids_from<R: BufRead>(arg: Option<&str>, input: R) -> Result<Vec<ChannelId>> {
    if let Some(id) = arg.map(str::trim).filter(|id| !id.is_empty()) {
        return Ok(vec![ChannelId::new(id)]);
    }

    let mut ids = Vec::new();
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            ids.push(ChannelId::new(line));
        }
    }
    Ok(ids)
}

/// Strip one leading `#` and one trailing `-`, then validate
pub fn normalize_prefix(raw: &str) -> Result<String> {
    let prefix = raw.trim();
    let prefix = prefix.strip_prefix('#').unwrap_or(prefix);
    let prefix = prefix.strip_suffix('-').unwrap_or(prefix);

    if !PREFIX_RE.is_match(prefix) {
        return Err(SlackMigrateError::InvalidInput(format!(
            "prefix {raw:?} must contain only lowercase letters, digits, '-' and '_'"
        )));
    }
    Ok(prefix.to_string())
}

pub struct ChannelBatch {
    api: Arc<dyn SlackApi>,
}

impl ChannelBatch {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    /// Archive every channel; needs no lookups
    pub fn plan_archive(&self, channels: Vec<ChannelId>) -> BatchPlan {
        BatchPlan {
            actions: channels
                .into_iter()
                .map(|channel| ChannelAction::Archive { channel })
                .collect(),
            ..Default::default()
        }
    }

    /// Resolve current names via `conversations.info` and build renames to
    /// `{prefix}-{name}`.
    ///
    /// `prefix` must already be normalized.
    pub async fn plan_prefix(&self, prefix: &str, channels: Vec<ChannelId>) -> Result<BatchPlan> {
        let marker = format!("{prefix}-");
        let mut plan = BatchPlan::default();

        for channel in channels {
            let info = match self.api.channel_info(&channel, Actor::Admin).await {
                Ok(info) => info,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(channel_id = %channel, error = %e, "Channel lookup failed");
                    plan.failed.push(ItemFailure {
                        channel,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if info.name.starts_with(&marker) {
                tracing::debug!(channel_id = %channel, name = %info.name, "Already prefixed");
                plan.skipped.push(Skipped {
                    channel,
                    name: info.name,
                });
                continue;
            }

            let to = format!("{marker}{}", info.name);
            if to.chars().count() > MAX_CHANNEL_NAME_LEN {
                plan.failed.push(ItemFailure {
                    channel,
                    reason: format!(
                        "new name {to} is longer than {MAX_CHANNEL_NAME_LEN} characters"
                    ),
                });
                continue;
            }

            plan.actions.push(ChannelAction::Rename {
                channel,
                from: info.name,
                to,
            });
        }

        Ok(plan)
    }

    /// Perform every planned action, in order.
    ///
    /// Planning failures and skips carry over into the report.
    pub async fn execute(&self, plan: BatchPlan) -> Result<BatchReport> {
        let _timer = Timer::new("channel_batch");
        let mut report = BatchReport {
            skipped: plan.skipped,
            failed: plan.failed,
            ..Default::default()
        };

        for action in plan.actions {
            match self.apply(&action).await {
                Ok(()) => {
                    tracing::info!(channel_id = %action.channel(), action = %action, "Done");
                    report.succeeded.push(action);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(channel_id = %action.channel(), error = %e, "Action failed");
                    report.failed.push(ItemFailure {
                        channel: action.channel().clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            succeeded = report.succeeded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Batch complete"
        );
        Ok(report)
    }

    async fn apply(&self, action: &ChannelAction) -> Result<()> {
        let actor = action.actor();
        self.ensure_member(action.channel(), actor).await?;

        match action {
            ChannelAction::Archive { channel } => self.api.archive_channel(channel).await,
            ChannelAction::Rename { channel, to, .. } => {
                self.api.rename_channel(channel, to).await
            }
        }
    }

    /// Join public channels the acting token is not in; private ones need an
    /// invite.
    async fn ensure_member(&self, channel: &ChannelId, actor: Actor) -> Result<()> {
        let info = self.api.channel_info(channel, actor).await?;
        if info.is_member {
            return Ok(());
        }
        if info.is_private {
            return Err(SlackMigrateError::api(
                "conversations.join",
                format!("not a member of private channel {channel}; invite the bot first"),
            ));
        }
        self.api.join_channel(channel, actor).await
    }
}
