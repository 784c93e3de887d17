//! Per-conversation message list with optimistic sends.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{ChatMessage, ConversationId, MessageId, UserId};
use crate::domain::errors::ApiError;
use crate::domain::pagination::{Page, PageRequest};

/// Longest message body the backend accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// A message shown before the backend acknowledged it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    pub nonce: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub failed: bool,
}

/// One row of the rendered thread.
#[derive(Debug, Clone, Copy)]
pub enum ThreadEntry<'a> {
    Delivered(&'a ChatMessage),
    Pending(&'a PendingMessage),
}

#[derive(Debug, Clone)]
pub struct MessageThread {
    conversation_id: ConversationId,
    me: UserId,
    delivered: Vec<ChatMessage>,
    pending: Vec<PendingMessage>,
    older: Option<PageRequest>,
}

impl MessageThread {
    #[must_use]
    pub fn new(conversation_id: ConversationId, me: UserId, per_page: u32) -> Self {
        Self {
            conversation_id,
            me,
            delivered: Vec::new(),
            pending: Vec::new(),
            older: Some(PageRequest::first(per_page)),
        }
    }

    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Validates the body and queues it as pending.
    pub fn begin_send(&mut self, body: &str) -> Result<PendingMessage, ApiError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ApiError::validation("Message is empty"));
        }
        if body.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ApiError::validation(format!(
                "Message is longer than {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let pending = PendingMessage {
            nonce: Uuid::new_v4().to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
            failed: false,
        };
        self.pending.push(pending.clone());
        Ok(pending)
    }

    /// Replaces the pending entry with the stored message.
    pub fn confirm(&mut self, nonce: &str, message: ChatMessage) {
        self.pending.retain(|p| p.nonce != nonce);
        self.insert(message);
    }

    /// Marks a pending message as failed. Returns `false` for unknown nonces.
    pub fn fail(&mut self, nonce: &str) -> bool {
        match self.pending.iter_mut().find(|p| p.nonce == nonce) {
            Some(pending) => {
                pending.failed = true;
                true
            }
            None => false,
        }
    }

    /// Body of a failed message to resend; the entry goes back to sending.
    pub fn retry(&mut self, nonce: &str) -> Option<String> {
        let pending = self
            .pending
            .iter_mut()
            .find(|p| p.nonce == nonce && p.failed)?;
        pending.failed = false;
        Some(pending.body.clone())
    }

    /// Most recent failed message, the target of the retry key.
    #[must_use]
    pub fn last_failed(&self) -> Option<&PendingMessage> {
        self.pending.iter().rev().find(|p| p.failed)
    }

    /// Adds a pushed message. Returns `false` if it was already known.
    pub fn receive(&mut self, message: ChatMessage) -> bool {
        if message.conversation_id() != self.conversation_id {
            return false;
        }
        if self.contains(message.id()) {
            return false;
        }
        if let Some(nonce) = message.client_nonce() {
            self.pending.retain(|p| p.nonce != nonce);
        }
        self.insert(message);
        true
    }

    /// Adds an older page (newest first on the wire) and advances the cursor.
    pub fn prepend_history(&mut self, page: Page<ChatMessage>) {
        let has_more = page.has_more();
        let request = PageRequest::at(page.page, page.per_page).next();
        for message in page.items {
            if message.conversation_id() == self.conversation_id && !self.contains(message.id()) {
                self.insert(message);
            }
        }
        self.older = has_more.then_some(request);
    }

    /// Request for the next older page, if any.
    #[must_use]
    pub const fn older_request(&self) -> Option<PageRequest> {
        self.older
    }

    #[must_use]
    pub fn is_mine(&self, message: &ChatMessage) -> bool {
        message.sender_id() == self.me
    }

    /// Delivered messages by `sent_at`, followed by pending ones.
    pub fn entries(&self) -> impl Iterator<Item = ThreadEntry<'_>> {
        self.delivered
            .iter()
            .map(ThreadEntry::Delivered)
            .chain(self.pending.iter().map(ThreadEntry::Pending))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.delivered.len() + self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: MessageId) -> bool {
        self.delivered.iter().any(|m| m.id() == id)
    }

    fn insert(&mut self, message: ChatMessage) {
        if self.contains(message.id()) {
            return;
        }
        let index = self
            .delivered
            .partition_point(|existing| existing.sent_at() <= message.sent_at());
        self.delivered.insert(index, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const CONV: ConversationId = ConversationId(5);
    const ME: UserId = UserId(1);

    fn msg(id: u64, minutes: i64) -> ChatMessage {
        let base = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        ChatMessage::new(id, CONV, UserId(2), format!("m{id}"), base + Duration::minutes(minutes))
    }

    fn bodies(thread: &MessageThread) -> Vec<String> {
        thread
            .entries()
            .map(|entry| match entry {
                ThreadEntry::Delivered(m) => m.body().to_string(),
                ThreadEntry::Pending(p) => format!("pending:{}", p.body),
            })
            .collect()
    }

    #[test]
    fn test_begin_send_validates() {
        let mut thread = MessageThread::new(CONV, ME, 20);
        assert!(thread.begin_send("   ").is_err());
        assert!(thread.begin_send(&"x".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
        assert!(thread.begin_send(&"é".repeat(MAX_MESSAGE_CHARS)).is_ok());
    }

    #[test]
    fn test_send_confirm_flow() {
        let mut thread = MessageThread::new(CONV, ME, 20);
        let pending = thread.begin_send(" hello ").unwrap();
        assert_eq!(pending.body, "hello");
        assert_eq!(bodies(&thread), vec!["pending:hello"]);

        let stored = ChatMessage::new(10_u64, CONV, ME, "hello", Utc::now()).with_nonce(&pending.nonce);
        thread.confirm(&pending.nonce, stored);
        assert_eq!(bodies(&thread), vec!["hello"]);
    }

    #[test]
    fn test_fail_and_retry() {
        let mut thread = MessageThread::new(CONV, ME, 20);
        let pending = thread.begin_send("hello").unwrap();

        assert!(thread.retry(&pending.nonce).is_none(), "not failed yet");
        assert!(thread.fail(&pending.nonce));
        assert_eq!(thread.last_failed().map(|p| p.nonce.clone()), Some(pending.nonce.clone()));
        assert_eq!(thread.retry(&pending.nonce).as_deref(), Some("hello"));
        assert!(thread.last_failed().is_none());
        assert!(!thread.fail("unknown"));
    }

    #[test]
    fn test_receive_dedups_by_id_and_nonce() {
        let mut thread = MessageThread::new(CONV, ME, 20);
        let pending = thread.begin_send("hi").unwrap();

        let echo = ChatMessage::new(11_u64, CONV, ME, "hi", Utc::now()).with_nonce(&pending.nonce);
        assert!(thread.receive(echo.clone()));
        assert!(!thread.receive(echo));
        assert_eq!(thread.len(), 1);

        let other = ChatMessage::new(12_u64, ConversationId(99), ME, "elsewhere", Utc::now());
        assert!(!thread.receive(other));
    }

    #[test]
    fn test_history_is_ordered_by_sent_at() {
        let mut thread = MessageThread::new(CONV, ME, 2);
        thread.receive(msg(3, 30));

        thread.prepend_history(Page::new(vec![msg(2, 20), msg(1, 10)], 1, 2, Some(4)));
        assert_eq!(bodies(&thread), vec!["m1", "m2", "m3"]);
        assert_eq!(thread.older_request().map(PageRequest::page), Some(2));

        thread.prepend_history(Page::new(vec![msg(0, 0)], 2, 2, Some(4)));
        assert_eq!(bodies(&thread), vec!["m0", "m1", "m2", "m3"]);
        assert!(thread.older_request().is_none());
    }
}
