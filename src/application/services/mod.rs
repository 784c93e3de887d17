pub mod favorites_service;
pub mod message_thread;
pub mod notification_manager;
pub mod search_service;

pub use favorites_service::{CommitOutcome, FavoritesService};
pub use message_thread::{MessageThread, PendingMessage, ThreadEntry};
pub use notification_manager::NotificationManager;
pub use search_service::{SearchService, Suggestion, SuggestionKind};
