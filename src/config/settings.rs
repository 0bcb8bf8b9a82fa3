use crate::error::{Result, SlackMigrateError};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct Settings {
    pub slack: SlackConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    /// Admin token used for renames; falls back to the bot token
    pub user_token: Option<String>,
    pub signing_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub page_size: u16,
    pub max_retries: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: 100,
            max_retries: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            data_dir: PathBuf::from("data"),
            cache_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl Settings {
    /// Build settings from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let slack = SlackConfig {
            bot_token: var("SLACK_BOT_TOKEN")
                .ok_or_else(|| SlackMigrateError::Config("SLACK_BOT_TOKEN not set".to_string()))?,
            user_token: var("SLACK_USER_TOKEN"),
            signing_secret: var("SLACK_SIGNING_SECRET"),
        };

        let api_defaults = ApiConfig::default();
        let api = ApiConfig {
            base_url: var("SLACK_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(api_defaults.base_url),
            page_size: parse_var(&var, "SLACK_MIGRATE_PAGE_SIZE")?.unwrap_or(api_defaults.page_size),
            max_retries: parse_var(&var, "SLACK_MIGRATE_MAX_RETRIES")?
                .unwrap_or(api_defaults.max_retries),
            timeout: parse_var::<u64, _>(&var, "SLACK_MIGRATE_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(api_defaults.timeout),
        };
        if api.page_size == 0 || api.page_size > 1000 {
            return Err(SlackMigrateError::Config(
                "SLACK_MIGRATE_PAGE_SIZE must be between 1 and 1000".to_string(),
            ));
        }

        let cache_ttl = match parse_var::<u64, _>(&var, "SLACK_MIGRATE_CACHE_TTL_HOURS")? {
            Some(hours) => hours
                .checked_mul(3600)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    SlackMigrateError::Config(format!(
                        "Invalid SLACK_MIGRATE_CACHE_TTL_HOURS: {hours} (too large)"
                    ))
                })?,
            None => StorageConfig::default().cache_ttl,
        };

        let storage_defaults = StorageConfig::default();
        let storage = StorageConfig {
            cache_dir: var("SLACK_MIGRATE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(storage_defaults.cache_dir),
            data_dir: var("SLACK_MIGRATE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(storage_defaults.data_dir),
            cache_ttl,
        };

        let format = match var("SLACK_MIGRATE_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(SlackMigrateError::Config(format!(
                    "Invalid SLACK_MIGRATE_LOG_FORMAT: {other} (expected text or json)"
                )));
            }
        };

        Ok(Settings {
            slack,
            api,
            storage,
            log: LogConfig { format },
        })
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| SlackMigrateError::Config(format!("Invalid {key}: {raw}")))
        })
        .transpose()
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    Settings::from_lookup(|key| std::env::var(key).ok())
}
