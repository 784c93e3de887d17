//! Events pushed by the realtime connection.

use crate::domain::entities::{ChatMessage, ConversationId, InboxNotification, Listing};

#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    Connected,
    Disconnected { reason: String, will_retry: bool },
    Reconnecting { attempt: u32 },
    MessageCreated(ChatMessage),
    ConversationRead(ConversationId),
    NotificationCreated(InboxNotification),
    ListingUpdated(Listing),
    CreditsUpdated { balance: i64 },
    Error { message: String, recoverable: bool },
}

impl RealtimeEvent {
    /// Whether the event describes the connection itself rather than marketplace data.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::Connected
                | Self::Disconnected { .. }
                | Self::Reconnecting { .. }
                | Self::Error { .. }
        )
    }
}
