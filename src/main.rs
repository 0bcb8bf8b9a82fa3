use clap::Parser;
use slack_migrate::cache::FileCacheStore;
use slack_migrate::cli::{App, Cli, RunStatus};
use slack_migrate::config::{LogFormat, Settings, load_settings};
use slack_migrate::error::Result;
use slack_migrate::logging::{init_tracing, log_error};
use slack_migrate::slack::SlackApiClient;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize rustls crypto provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(cli.verbose, false);
            log_error("load_settings", &e);
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(cli.verbose, settings.log.format == LogFormat::Json);

    match run(cli, settings).await {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            log_error("command", &e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut settings: Settings) -> Result<RunStatus> {
    if let Some(dir) = cli.cache_dir {
        settings.storage.cache_dir = dir;
    }
    if let Some(dir) = cli.data_dir {
        settings.storage.data_dir = dir;
    }
    tracing::debug!(
        cache_dir = %settings.storage.cache_dir.display(),
        data_dir = %settings.storage.data_dir.display(),
        base_url = %settings.api.base_url,
        "Configuration loaded"
    );

    let api = Arc::new(SlackApiClient::new(&settings.slack, &settings.api)?);
    let cache = Arc::new(FileCacheStore::new(settings.storage.cache_dir.clone()));
    let app = App::new(api, cache.clone(), &settings.storage);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let result = app.run(cli.command, stdin.lock(), &mut stdout).await;

    cache.log_stats().await;
    result
}
