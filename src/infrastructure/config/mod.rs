//! Application configuration.

pub mod app_config;
pub mod args;
pub mod preferences;
pub mod storage;

pub use app_config::{
    ApiConfig, AppConfig, LogLevel, NotificationsConfig, SearchConfig, ThemeConfig, ThemeMode,
    UiConfig,
};
pub use args::CliArgs;
pub use preferences::Preferences;
pub use storage::{ConfigError, StorageManager};
