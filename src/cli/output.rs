//! Human-readable tables and CSV exports for fetched records.

use crate::error::Result;
use crate::models::{ChannelRecord, EmojiRecord, UserRecord};
use crate::ops::{BatchPlan, BatchReport, DownloadSummary};
use chrono::{DateTime, Utc};
use comfy_table::{Table, presets};
use serde::Serialize;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

pub const CHANNELS_CSV: &str = "channels.csv";
pub const USERS_CSV: &str = "users.csv";

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn plain_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table
}

/// `total N` followed by one aligned row per channel
pub fn channels_table(channels: &[ChannelRecord]) -> String {
    let mut table = plain_table();
    for c in channels {
        table.add_row(vec![
            c.id.to_string(),
            c.display_name(),
            c.member_count.to_string(),
            format_datetime(&c.created_at),
            c.updated_at
                .as_ref()
                .map(format_datetime)
                .unwrap_or_else(|| "<updated unknown>".to_string()),
            c.creator_email().unwrap_or_default().to_string(),
            c.status().to_string(),
        ]);
    }
    with_total(channels.len(), table)
}

pub fn users_table(users: &[UserRecord]) -> String {
    let mut table = plain_table();
    for u in users {
        table.add_row(vec![
            u.id.clone(),
            format!("@{}", u.name),
            u.real_name.clone().unwrap_or_default(),
            u.email.clone().unwrap_or_else(|| "<no email>".to_string()),
        ]);
    }
    with_total(users.len(), table)
}

fn with_total(total: usize, table: Table) -> String {
    if total == 0 {
        return format!("total {total}\n");
    }
    format!("total {total}\n{table}\n")
}

/// One `:name:` per line; aliases point at their target
pub fn emoji_list(emoji: &[EmojiRecord]) -> String {
    let mut out = String::new();
    for e in emoji {
        match e.alias_target.as_deref().filter(|_| e.is_alias) {
            Some(target) => {
                let _ = writeln!(out, ":{}: -> :{}:", e.name, target);
            }
            None => {
                let _ = writeln!(out, ":{}:", e.name);
            }
        }
    }
    out
}

#[derive(Serialize)]
struct ChannelRow<'a> {
    id: &'a str,
    name: &'a str,
    num_members: u64,
    created: String,
    updated: String,
    is_archived: bool,
    creator_id: &'a str,
    creator_email: &'a str,
    topic: &'a str,
    purpose: &'a str,
}

#[derive(Serialize)]
struct UserRow<'a> {
    id: &'a str,
    name: &'a str,
    real_name: &'a str,
    display_name: &'a str,
    email: &'a str,
    is_bot: bool,
    deleted: bool,
}

pub fn write_channels_csv<W: io::Write>(writer: W, channels: &[ChannelRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for c in channels {
        csv.serialize(ChannelRow {
            id: c.id.as_str(),
            name: &c.name,
            num_members: c.member_count,
            created: format_datetime(&c.created_at),
            updated: c.updated_at.as_ref().map(format_datetime).unwrap_or_default(),
            is_archived: c.archived,
            creator_id: c.creator_id.as_deref().unwrap_or_default(),
            creator_email: c.creator_email().unwrap_or_default(),
            topic: c.topic.as_deref().unwrap_or_default(),
            purpose: c.purpose.as_deref().unwrap_or_default(),
        })?;
    }
    if channels.is_empty() {
        csv.write_record(CHANNEL_HEADERS)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_users_csv<W: io::Write>(writer: W, users: &[UserRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for u in users {
        csv.serialize(UserRow {
            id: &u.id,
            name: &u.name,
            real_name: u.real_name.as_deref().unwrap_or_default(),
            display_name: u.display_name.as_deref().unwrap_or_default(),
            email: u.email.as_deref().unwrap_or_default(),
            is_bot: u.is_bot,
            deleted: u.deleted,
        })?;
    }
    if users.is_empty() {
        csv.write_record(USER_HEADERS)?;
    }
    csv.flush()?;
    Ok(())
}

// serde only emits headers alongside the first row
const CHANNEL_HEADERS: [&str; 10] = [
    "id",
    "name",
    "num_members",
    "created",
    "updated",
    "is_archived",
    "creator_id",
    "creator_email",
    "topic",
    "purpose",
];
const USER_HEADERS: [&str; 7] = [
    "id",
    "name",
    "real_name",
    "display_name",
    "email",
    "is_bot",
    "deleted",
];

/// Create the file (and its parent directory) and hand it to `write`
pub fn export_csv<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(std::fs::File) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write(file)?;
    tracing::info!(path = %path.display(), "CSV exported");
    Ok(())
}

pub fn dry_run_preview(plan: &BatchPlan) -> String {
    let mut out = String::new();
    for line in plan.preview() {
        let _ = writeln!(out, "DRY RUN: would {line}");
    }
    for skipped in &plan.skipped {
        let _ = writeln!(
            out,
            "DRY RUN: would skip {} (#{} already prefixed)",
            skipped.channel, skipped.name
        );
    }
    for failed in &plan.failed {
        let _ = writeln!(out, "DRY RUN: cannot process {}: {}", failed.channel, failed.reason);
    }
    out
}

pub fn batch_summary(verb: &str, report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Successfully {verb} {} channel(s).", report.succeeded.len());

    if !report.skipped.is_empty() {
        let _ = writeln!(
            out,
            "Skipped {} channel(s) (already have prefix):",
            report.skipped.len()
        );
        for skipped in &report.skipped {
            let _ = writeln!(out, "  - {} (#{})", skipped.channel, skipped.name);
        }
    }

    if report.has_failures() {
        let _ = writeln!(out, "Failed {} channel(s):", report.failed.len());
        for failed in &report.failed {
            let _ = writeln!(out, "  - {}: {}", failed.channel, failed.reason);
        }
    }
    out
}

pub fn download_summary(dir: &Path, summary: &DownloadSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Emoji download complete ({}):", dir.display());
    let _ = writeln!(out, "  - Total: {}", summary.total);
    let _ = writeln!(out, "  - Downloaded: {}", summary.downloaded);
    let _ = writeln!(out, "  - Aliases (skipped): {}", summary.aliases);
    let _ = writeln!(out, "  - Failed: {}", summary.failed.len());
    for (name, reason) in &summary.failed {
        let _ = writeln!(out, "    - :{name}: {reason}");
    }
    out
}
