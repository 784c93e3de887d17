//! Marketplace user entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

impl UserRole {
    /// Whether the role may open the admin dashboard.
    #[must_use]
    pub const fn can_moderate(self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    /// Whether the role may ban or unban users.
    #[must_use]
    pub const fn can_manage_users(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Moderator => write!(f, "moderator"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Banned,
    Pending,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Banned => write!(f, "banned"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    role: UserRole,
    #[serde(default)]
    status: UserStatus,
    #[serde(default)]
    credits: i64,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar_url: None,
            role: UserRole::User,
            status: UserStatus::Active,
            credits: 0,
            location: None,
            created_at: None,
        }
    }

    #[must_use]
    pub const fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_credits(mut self, credits: i64) -> Self {
        self.credits = credits;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    #[must_use]
    pub const fn status(&self) -> UserStatus {
        self.status
    }

    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
    }

    #[must_use]
    pub const fn credits(&self) -> i64 {
        self.credits
    }

    pub fn set_credits(&mut self, credits: i64) {
        self.credits = credits;
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Name shown in headers; falls back to the email local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.clone();
        }
        self.email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .map_or_else(|| format!("user {}", self.id), ToString::to_string)
    }

    #[must_use]
    pub const fn is_banned(&self) -> bool {
        matches!(self.status, UserStatus::Banned)
    }
}

impl super::Identified for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}
