//! Domain layer with core marketplace entities, client-side state machines and port definitions.

/// Connection status definitions.
pub mod connection;
/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Optimistic favorites.
pub mod favorites;
/// Listing filters.
pub mod filters;
/// Keybinding definitions.
pub mod keybinding;
/// Toast messages.
pub mod notification;
/// Paged collections.
pub mod pagination;
/// Port definitions.
pub mod ports;
/// Realtime events.
pub mod realtime;
/// Search parsing and history.
pub mod search;
/// Serde utilities.
pub mod serde_utils;

pub use connection::ConnectionStatus;
pub use entities::{AuthToken, User};
pub use errors::ApiError;
pub use ports::{AuthPort, MarketplaceDataPort, TokenStoragePort};
