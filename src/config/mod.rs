mod settings;

pub use settings::{
    ApiConfig, DEFAULT_API_BASE_URL, LogConfig, LogFormat, Settings, SlackConfig, StorageConfig,
    load_settings,
};
