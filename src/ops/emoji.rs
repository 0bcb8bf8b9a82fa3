use crate::error::{Result, SlackMigrateError};
use crate::logging::Timer;
use crate::models::EmojiRecord;
use crate::slack::SlackApi;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Subdirectory of the data directory that receives emoji images
pub const EMOJI_DIR: &str = "custom-emojis-files";

const DEFAULT_EXTENSION: &str = "png";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub total: usize,
    pub downloaded: usize,
    pub aliases: usize,
    /// Emoji name and reason
    pub failed: Vec<(String, String)>,
}

/// Local file name for an emoji: `:` dropped, `/` turned into `_`, extension
/// taken from the URL path.
pub fn emoji_file_name(name: &str, url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| SlackMigrateError::InvalidInput(format!("emoji URL {url:?}: {e}")))?;

    let extension = Path::new(parsed.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION);

    let safe_name = name.replace(':', "").replace('/', "_");
    Ok(format!("{safe_name}.{extension}"))
}

pub struct EmojiDownloader {
    api: Arc<dyn SlackApi>,
    dir: PathBuf,
}

impl EmojiDownloader {
    pub fn new(api: Arc<dyn SlackApi>, data_dir: impl AsRef<Path>) -> Self {
        Self {
            api,
            dir: data_dir.as_ref().join(EMOJI_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download every non-alias emoji, one at a time and in listing order. A
    /// failed download is counted and the rest continue; an auth failure stops
    /// the run.
    pub async fn download_all(&self, emoji: &[EmojiRecord]) -> Result<DownloadSummary> {
        let _timer = Timer::new("emoji_download");
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut summary = DownloadSummary {
            total: emoji.len(),
            ..Default::default()
        };

        let images: Vec<&EmojiRecord> = emoji
            .iter()
            .filter(|e| {
                if e.is_alias {
                    tracing::debug!(emoji = %e.name, "Skipping alias");
                }
                !e.is_alias
            })
            .collect();
        summary.aliases = summary.total - images.len();

        for emoji in images {
            match self.download_one(emoji).await {
                Ok(path) => {
                    tracing::debug!(emoji = %emoji.name, path = %path.display(), "Downloaded");
                    summary.downloaded += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(emoji = %emoji.name, error = %e, "Emoji download failed");
                    summary.failed.push((emoji.name.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            total = summary.total,
            downloaded = summary.downloaded,
            aliases = summary.aliases,
            failed = summary.failed.len(),
            "Emoji download complete"
        );
        Ok(summary)
    }

    async fn download_one(&self, emoji: &EmojiRecord) -> Result<PathBuf> {
        let url = emoji.url.as_deref().ok_or_else(|| {
            SlackMigrateError::InvalidInput(format!("emoji {} has no image URL", emoji.name))
        })?;

        let path = self.dir.join(emoji_file_name(&emoji.name, url)?);
        let bytes = self.api.download(url).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSlack;
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_uses_url_extension() {
        assert_eq!(
            emoji_file_name("party-parrot", "https://emoji.example.com/T1/party/abc.gif").unwrap(),
            "party-parrot.gif"
        );
        assert_eq!(
            emoji_file_name("a:b/c", "https://emoji.example.com/x/y.png?v=2").unwrap(),
            "ab_c.png"
        );
    }

    #[test]
    fn test_file_name_defaults_to_png() {
        assert_eq!(
            emoji_file_name("blob", "https://emoji.example.com/T1/blob").unwrap(),
            "blob.png"
        );
        assert!(emoji_file_name("blob", "not a url").is_err());
    }

    #[tokio::test]
    async fn test_download_skips_aliases_and_counts_failures() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeSlack {
            files: HashMap::from([(
                "https://emoji.example.com/ok.gif".to_string(),
                b"GIF89a".to_vec(),
            )]),
            ..Default::default()
        });
        let emoji = vec![
            EmojiRecord::from_listing("ok", "https://emoji.example.com/ok.gif"),
            EmojiRecord::from_listing("gone", "https://emoji.example.com/gone.png"),
            EmojiRecord::from_listing("same", "alias:ok"),
        ];

        let downloader = EmojiDownloader::new(api.clone(), dir.path());
        let summary = downloader.download_all(&emoji).await.unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.aliases, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "gone");

        let written = std::fs::read(dir.path().join(EMOJI_DIR).join("ok.gif")).unwrap();
        assert_eq!(written, b"GIF89a");
        assert!(!api.calls().iter().any(|c| c.contains("alias")));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_downloads_run_one_at_a_time() {
        let dir = TempDir::new().unwrap();
        let urls: Vec<String> = (0..10)
            .map(|i| format!("https://emoji.example.com/e{i}.png"))
            .collect();
        let api = Arc::new(FakeSlack {
            files: urls.iter().map(|u| (u.clone(), b"PNG".to_vec())).collect(),
            download_delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let emoji: Vec<EmojiRecord> = urls
            .iter()
            .enumerate()
            .map(|(i, u)| EmojiRecord::from_listing(format!("e{i}"), u))
            .collect();

        let summary = EmojiDownloader::new(api.clone(), dir.path())
            .download_all(&emoji)
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 10);
        assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 1);
        let downloads: Vec<String> = api
            .calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("download ").map(str::to_string))
            .collect();
        assert_eq!(downloads, urls);
    }

    #[tokio::test]
    async fn test_download_aborts_on_auth_failure() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeSlack {
            revoked: true,
            ..Default::default()
        });
        let emoji = vec![EmojiRecord::from_listing(
            "ok",
            "https://emoji.example.com/ok.gif",
        )];

        let err = EmojiDownloader::new(api, dir.path())
            .download_all(&emoji)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
