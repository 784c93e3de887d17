use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use bazaar::infrastructure::{
    AppConfig, CliArgs, DesktopNotificationService, KeyringTokenStorage, MarketplaceClient,
    Preferences, StorageManager,
};
use bazaar::presentation::{App, AppPorts};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn create_app() -> Result<(App, Option<String>)> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    let sound_override = args.notification_sound;
    config.merge_with_args(args);
    let cli_token = config.token.clone();

    init_logging(&config)?;

    info!(version = bazaar::VERSION, api = %config.api.base_url, "Starting Bazaar");

    let preferences = storage.load_preferences().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load preferences, using defaults");
        Preferences::default()
    });

    let client = Arc::new(MarketplaceClient::new(
        config.api.base_url.clone(),
        config.api.timeout(),
    )?);
    let ports = AppPorts {
        auth: client.clone(),
        marketplace: client,
        token_storage: Arc::new(KeyringTokenStorage::new()),
        notifier: Arc::new(DesktopNotificationService::new(
            config.notifications.desktop,
            config.notifications.sound,
        )),
    };

    let app =
        App::new(config, storage, preferences, ports).with_sound_override(sound_override);

    Ok((app, cli_token))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (app, cli_token) = create_app()?;

    let mut terminal = ratatui::init();

    let result = app.run(&mut terminal, cli_token).await;

    ratatui::restore();

    result
}
