use crate::cache::CacheStore;
use crate::cli::output;
use crate::cli::{ChannelFetchArgs, ChannelsCmd, Command, EmojiCmd, UsersCmd};
use crate::config::StorageConfig;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::ChannelId;
use crate::ops::{self, BatchPlan, ChannelBatch, EmojiDownloader};
use crate::slack::SlackApi;
use chrono::Utc;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

const NO_CHANNEL_IDS: &str = "No channel IDs provided. Pass a channel ID or pipe one ID per line.";

/// How a command finished when it did not error out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// A batch ran to the end but some items failed
    ItemsFailed,
}

impl RunStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Success => 0,
            RunStatus::ItemsFailed => 2,
        }
    }
}

pub struct App {
    api: Arc<dyn SlackApi>,
    fetcher: Fetcher,
    data_dir: PathBuf,
}

impl App {
    pub fn new(
        api: Arc<dyn SlackApi>,
        cache: Arc<dyn CacheStore>,
        storage: &StorageConfig,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(api.clone(), cache, storage.cache_ttl),
            api,
            data_dir: storage.data_dir.clone(),
        }
    }

    /// Run one command. `input` supplies channel IDs when none is given on
    /// the command line; everything user-facing is written to `out`.
    pub async fn run<R, W>(&self, command: Command, input: R, out: &mut W) -> Result<RunStatus>
    where
        R: BufRead,
        W: Write,
    {
        match command {
            Command::Channels { action } => match action {
                ChannelsCmd::Fetch(args) => self.fetch_channels(&args, out).await,
                ChannelsCmd::Archive {
                    channel_id,
                    dry_run,
                } => {
                    let ids = ops::channel_ids_from(channel_id.as_deref(), input)?;
                    self.archive(ids, dry_run, out).await
                }
                ChannelsCmd::Prefix {
                    prefix,
                    channel_id,
                    dry_run,
                } => {
                    let prefix = ops::normalize_prefix(&prefix)?;
                    let ids = ops::channel_ids_from(channel_id.as_deref(), input)?;
                    self.prefix(&prefix, ids, dry_run, out).await
                }
            },
            Command::Emoji { action } => match action {
                EmojiCmd::Fetch { refresh } => {
                    let emoji = self.fetcher.emoji(refresh).await?;
                    out.write_all(output::emoji_list(&emoji.records).as_bytes())?;
                    Ok(RunStatus::Success)
                }
                EmojiCmd::Download { refresh } => self.download_emoji(refresh, out).await,
            },
            Command::Users { action } => match action {
                UsersCmd::Fetch { refresh, csv } => {
                    let users = self.fetcher.users(refresh).await?;
                    write!(out, "{}", output::users_table(&users.records))?;
                    if csv {
                        let path = self.data_dir.join(output::USERS_CSV);
                        output::export_csv(&path, |file| {
                            output::write_users_csv(file, &users.records)
                        })?;
                        writeln!(out, "Users exported to {}", path.display())?;
                    }
                    Ok(RunStatus::Success)
                }
            },
        }
    }

    async fn fetch_channels<W: Write>(
        &self,
        args: &ChannelFetchArgs,
        out: &mut W,
    ) -> Result<RunStatus> {
        let fetched = self.fetcher.channels(args.refresh).await?;
        let channels = args.filter().apply(&fetched.records, Utc::now());
        tracing::debug!(
            total = fetched.records.len(),
            matched = channels.len(),
            "Applied channel filters"
        );

        if args.csv {
            let path = self.data_dir.join(output::CHANNELS_CSV);
            output::export_csv(&path, |file| output::write_channels_csv(file, &channels))?;
            writeln!(out, "total {}", channels.len())?;
            writeln!(out, "Channels exported to {}", path.display())?;
        } else {
            write!(out, "{}", output::channels_table(&channels))?;
        }
        Ok(RunStatus::Success)
    }

    async fn archive<W: Write>(
        &self,
        ids: Vec<ChannelId>,
        dry_run: bool,
        out: &mut W,
    ) -> Result<RunStatus> {
        if ids.is_empty() {
            writeln!(out, "{NO_CHANNEL_IDS}")?;
            return Ok(RunStatus::Success);
        }

        let batch = ChannelBatch::new(self.api.clone());
        let plan = batch.plan_archive(ids);
        self.finish_batch(&batch, plan, "archived", dry_run, out).await
    }

    async fn prefix<W: Write>(
        &self,
        prefix: &str,
        ids: Vec<ChannelId>,
        dry_run: bool,
        out: &mut W,
    ) -> Result<RunStatus> {
        if ids.is_empty() {
            writeln!(out, "{NO_CHANNEL_IDS}")?;
            return Ok(RunStatus::Success);
        }

        writeln!(out, "Found {} channel(s) to process.", ids.len())?;
        let batch = ChannelBatch::new(self.api.clone());
        let plan = batch.plan_prefix(prefix, ids).await?;
        self.finish_batch(&batch, plan, "renamed", dry_run, out).await
    }

    async fn finish_batch<W: Write>(
        &self,
        batch: &ChannelBatch,
        plan: BatchPlan,
        verb: &str,
        dry_run: bool,
        out: &mut W,
    ) -> Result<RunStatus> {
        if dry_run {
            write!(out, "{}", output::dry_run_preview(&plan))?;
            return Ok(RunStatus::Success);
        }

        let report = batch.execute(plan).await?;
        write!(out, "{}", output::batch_summary(verb, &report))?;
        Ok(if report.has_failures() {
            RunStatus::ItemsFailed
        } else {
            RunStatus::Success
        })
    }

    async fn download_emoji<W: Write>(&self, refresh: bool, out: &mut W) -> Result<RunStatus> {
        let emoji = self.fetcher.emoji(refresh).await?;
        writeln!(out, "Found {} custom emoji.", emoji.records.len())?;

        let downloader = EmojiDownloader::new(self.api.clone(), &self.data_dir);
        let summary = downloader.download_all(&emoji.records).await?;
        write!(out, "{}", output::download_summary(downloader.dir(), &summary))?;

        Ok(if summary.failed.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::ItemsFailed
        })
    }
}
