//! Application configuration.

use crate::domain::keybinding::Action;
use crate::domain::pagination::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::domain::search::DEFAULT_RECENT_CAPACITY;
use crate::infrastructure::api::DEFAULT_API_BASE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub(crate) const APP_NAME: &str = "bazaar";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "bazaar";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, from `config.toml` and the command line.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Token given on the command line or in `BAZAAR_TOKEN`. Never written to disk.
    #[serde(skip)]
    pub token: Option<String>,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub search: SearchConfig,

    /// Custom keybindings, key spec to action.
    #[serde(default)]
    pub keybindings: HashMap<String, Action>,
}

/// Backend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// WebSocket endpoint; derived from `base_url` when unset.
    #[serde(default)]
    pub ws_url: Option<String>,

    /// Public site used for "open in browser"; derived from `base_url` when unset.
    #[serde(default)]
    pub web_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_true")]
    pub realtime: bool,
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PER_PAGE)
    }

    #[must_use]
    pub fn effective_ws_url(&self) -> String {
        self.ws_url
            .clone()
            .unwrap_or_else(|| derive_ws_url(&self.base_url))
    }

    #[must_use]
    pub fn effective_web_url(&self) -> String {
        self.web_url
            .clone()
            .unwrap_or_else(|| derive_web_url(&self.base_url))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: None,
            web_url: None,
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            realtime: true,
        }
    }
}

/// Splits `scheme://host[:port]/path` into scheme and authority.
fn split_origin(url: &str) -> (&str, &str) {
    let (scheme, rest) = url.split_once("://").unwrap_or(("http", url));
    let authority = rest.split('/').next().unwrap_or(rest);
    (scheme, authority)
}

/// `http(s)://host/api/v1` becomes `ws(s)://host/ws`.
#[must_use]
pub fn derive_ws_url(base_url: &str) -> String {
    let (scheme, authority) = split_origin(base_url.trim());
    let ws_scheme = if scheme.eq_ignore_ascii_case("https") {
        "wss"
    } else {
        "ws"
    };
    format!("{ws_scheme}://{authority}/ws")
}

#[must_use]
pub fn derive_web_url(base_url: &str) -> String {
    let (scheme, authority) = split_origin(base_url.trim());
    format!("{scheme}://{authority}")
}

/// UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Date format string (chrono format).
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Show the image count column in listing tables.
    #[serde(default = "default_true")]
    pub show_images_count: bool,

    /// Toast duration in seconds.
    #[serde(default = "default_notification_duration")]
    pub notification_duration: u64,
}

impl UiConfig {
    #[must_use]
    pub const fn notification_duration(&self) -> Duration {
        Duration::from_secs(self.notification_duration)
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            show_images_count: true,
            notification_duration: default_notification_duration(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Desktop notifications for new messages and inbox items.
    #[serde(default = "default_true")]
    pub desktop: bool,

    /// Terminal bell on new messages.
    #[serde(default)]
    pub sound: bool,

    /// In-app toasts for non-error events.
    #[serde(default = "default_true")]
    pub internal: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            sound: false,
            internal: true,
        }
    }
}

/// Theme mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Dark mode (default).
    #[default]
    Dark,
    /// Light mode.
    Light,
}

/// Theme configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Accent color (name or hex code).
    #[serde(default = "default_accent_color")]
    pub accent_color: String,

    #[serde(default)]
    pub mode: ThemeMode,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent_color: default_accent_color(),
            mode: ThemeMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// How many recent searches are remembered.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

const fn default_timeout_secs() -> u64 {
    15
}

const fn default_page_size() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_accent_color() -> String {
    "Cyan".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_notification_duration() -> u64 {
    5
}

const fn default_recent_limit() -> usize {
    DEFAULT_RECENT_CAPACITY
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(api_url) = args.api_url {
            self.api.base_url = api_url;
        }
        if let Some(ws_url) = args.ws_url {
            self.api.ws_url = Some(ws_url);
        }
        if let Some(token) = args.token {
            self.token = Some(token);
        }
        if let Some(page_size) = args.page_size {
            self.api.page_size = page_size;
        }
        if let Some(sound) = args.notification_sound {
            self.notifications.sound = sound;
        }
        if let Some(desktop) = args.desktop_notifications {
            self.notifications.desktop = desktop;
        }
        if let Some(accent_color) = args.accent_color {
            self.theme.accent_color = accent_color;
        }
        if args.no_realtime {
            self.api.realtime = false;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("bazaar.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            token: None,
            log_level: LogLevel::Info,
            api: ApiConfig::default(),
            ui: UiConfig::default(),
            notifications: NotificationsConfig::default(),
            theme: ThemeConfig::default(),
            search: SearchConfig::default(),
            keybindings: HashMap::new(),
        }
    }
}
