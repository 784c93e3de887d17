//! Infrastructure layer with external service adapters.

/// Marketplace REST client.
pub mod api;
pub mod browser;
/// Application configuration.
pub mod config;
/// System notifications.
pub mod notifications;
/// Realtime WebSocket client.
pub mod realtime;
/// Token storage adapters.
pub mod storage;

pub use api::MarketplaceClient;
pub use config::{AppConfig, CliArgs, LogLevel, Preferences, StorageManager};
pub use notifications::DesktopNotificationService;
pub use realtime::{RealtimeClient, RealtimeClientConfig};
pub use storage::KeyringTokenStorage;
