//! Inbox notification entity (server-side notifications, not toasts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NotificationId;
use crate::domain::serde_utils::null_as_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxKind {
    Message,
    Favorite,
    ListingApproved,
    ListingRejected,
    Credits,
    #[default]
    #[serde(other)]
    System,
}

impl InboxKind {
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Message => "✉",
            Self::Favorite => "♥",
            Self::ListingApproved => "✓",
            Self::ListingRejected => "✗",
            Self::Credits => "¤",
            Self::System => "•",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxNotification {
    id: NotificationId,
    #[serde(default)]
    kind: InboxKind,
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    body: String,
    #[serde(default)]
    read: bool,
    created_at: DateTime<Utc>,
    #[serde(default)]
    link: Option<String>,
}

impl InboxNotification {
    #[must_use]
    pub fn new(
        id: impl Into<NotificationId>,
        kind: InboxKind,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            body: String::new(),
            read: false,
            created_at,
            link: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> InboxKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.read
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

impl super::Identified for InboxNotification {
    type Id = NotificationId;

    fn id(&self) -> NotificationId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_falls_back_to_system() {
        let json = r#"{"id":1,"kind":"promo_blast","title":"Hi","created_at":"2026-01-01T00:00:00Z"}"#;
        let n: InboxNotification = serde_json::from_str(json).unwrap();
        assert_eq!(n.kind(), InboxKind::System);
        assert!(!n.is_read());
    }
}
