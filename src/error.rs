use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlackMigrateError {
    #[error("Slack authentication failed ({0}). Check SLACK_BOT_TOKEN and SLACK_USER_TOKEN")]
    Auth(String),

    #[error("Slack rate limit exceeded for {method} (retry after {retry_after_secs}s)")]
    RateLimited {
        method: String,
        retry_after_secs: u64,
    },

    #[error("Slack API error in {method}: {message}")]
    Api { method: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cache for {dataset} is unreadable: {reason}")]
    CacheCorruption { dataset: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SlackMigrateError {
    /// Errors that must stop the whole run instead of a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    pub fn api(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SlackMigrateError>;
