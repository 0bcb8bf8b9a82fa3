//! Commands that change something: channel batches and emoji export.

mod channels;
mod emoji;

pub use channels::{
    BatchPlan, BatchReport, ChannelAction, ChannelBatch, ItemFailure, MAX_CHANNEL_NAME_LEN,
    Skipped, channel_ids_from, normalize_prefix,
};
pub use emoji::{DownloadSummary, EMOJI_DIR, EmojiDownloader, emoji_file_name};
