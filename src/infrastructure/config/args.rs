use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "bazaar",
    version,
    about = "A terminal client for the Bazaar marketplace",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// REST API base URL.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// WebSocket URL for realtime updates.
    #[arg(long, value_name = "URL")]
    pub ws_url: Option<String>,

    /// Session token (skips the login form).
    #[arg(long, env = "BAZAAR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Items per page.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Ring the terminal bell on new messages.
    #[arg(long)]
    pub notification_sound: Option<bool>,

    /// Enable desktop notifications.
    #[arg(long)]
    pub desktop_notifications: Option<bool>,

    /// Accent color (name or hex code).
    #[arg(long)]
    pub accent_color: Option<String>,

    /// Do not open the realtime connection.
    #[arg(long)]
    pub no_realtime: bool,
}
