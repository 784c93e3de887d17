//! Conversation and chat message entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, ListingId, MessageId, UserId};

/// Listing a conversation is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRef {
    pub id: ListingId,
    #[serde(default)]
    pub title: String,
}

/// The other participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    conversation_id: ConversationId,
    sender_id: UserId,
    body: String,
    sent_at: DateTime<Utc>,
    #[serde(default)]
    client_nonce: Option<String>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(
        id: impl Into<MessageId>,
        conversation_id: ConversationId,
        sender_id: UserId,
        body: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id,
            sender_id,
            body: body.into(),
            sent_at,
            client_nonce: None,
        }
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.client_nonce = Some(nonce.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    #[must_use]
    pub const fn sender_id(&self) -> UserId {
        self.sender_id
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    #[must_use]
    pub fn client_nonce(&self) -> Option<&str> {
        self.client_nonce.as_deref()
    }
}

impl super::Identified for ChatMessage {
    type Id = MessageId;

    fn id(&self) -> MessageId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    #[serde(default)]
    listing: Option<ListingRef>,
    counterpart: Participant,
    #[serde(default)]
    last_message: Option<ChatMessage>,
    #[serde(default)]
    unread_count: u32,
    updated_at: DateTime<Utc>,
}

impl Conversation {
    #[must_use]
    pub fn new(
        id: impl Into<ConversationId>,
        counterpart: Participant,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            listing: None,
            counterpart,
            last_message: None,
            unread_count: 0,
            updated_at,
        }
    }

    #[must_use]
    pub fn with_listing(mut self, listing: ListingRef) -> Self {
        self.listing = Some(listing);
        self
    }

    #[must_use]
    pub const fn with_unread(mut self, count: u32) -> Self {
        self.unread_count = count;
        self
    }

    #[must_use]
    pub const fn id(&self) -> ConversationId {
        self.id
    }

    #[must_use]
    pub const fn listing(&self) -> Option<&ListingRef> {
        self.listing.as_ref()
    }

    #[must_use]
    pub const fn counterpart(&self) -> &Participant {
        &self.counterpart
    }

    #[must_use]
    pub fn counterpart_label(&self) -> &str {
        if self.counterpart.name.is_empty() {
            "Unknown user"
        } else {
            &self.counterpart.name
        }
    }

    #[must_use]
    pub const fn last_message(&self) -> Option<&ChatMessage> {
        self.last_message.as_ref()
    }

    #[must_use]
    pub const fn unread_count(&self) -> u32 {
        self.unread_count
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records a new message and bumps activity.
    ///
    /// Messages sent by `me` do not count as unread.
    pub fn record_message(&mut self, message: ChatMessage, me: UserId) {
        if message.sent_at() >= self.updated_at {
            self.updated_at = message.sent_at();
        }
        if message.sender_id() != me {
            self.unread_count = self.unread_count.saturating_add(1);
        }
        self.last_message = Some(message);
    }

    pub fn mark_read(&mut self) {
        self.unread_count = 0;
    }

    /// One-line preview of the last message.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        let Some(message) = &self.last_message else {
            return String::from("No messages yet");
        };
        let flat = message.body().replace('\n', " ");
        if flat.chars().count() <= max_chars {
            return flat;
        }
        let truncated: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

impl super::Identified for Conversation {
    type Id = ConversationId;

    fn id(&self) -> ConversationId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn conversation() -> Conversation {
        Conversation::new(
            1_u64,
            Participant {
                id: UserId(9),
                name: "Sam".into(),
            },
            Utc::now() - Duration::hours(1),
        )
    }

    #[test]
    fn test_record_message_counts_unread_from_others() {
        let mut conv = conversation();
        let now = Utc::now();

        conv.record_message(ChatMessage::new(1_u64, conv.id(), UserId(9), "hi", now), UserId(1));
        assert_eq!(conv.unread_count(), 1);
        assert_eq!(conv.updated_at(), now);

        conv.record_message(ChatMessage::new(2_u64, conv.id(), UserId(1), "hey", now), UserId(1));
        assert_eq!(conv.unread_count(), 1);

        conv.mark_read();
        assert_eq!(conv.unread_count(), 0);
    }

    #[test]
    fn test_preview_truncates() {
        let mut conv = conversation();
        assert_eq!(conv.preview(10), "No messages yet");

        conv.record_message(
            ChatMessage::new(1_u64, conv.id(), UserId(9), "is this still\navailable?", Utc::now()),
            UserId(1),
        );
        assert_eq!(conv.preview(8), "is this…");
        assert_eq!(conv.preview(100), "is this still available?");
    }
}
