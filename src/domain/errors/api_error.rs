//! Marketplace API error types.

use thiserror::Error;

/// Errors surfaced by the backend adapters and use cases.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    #[error("invalid token format: {reason}")]
    InvalidTokenFormat { reason: String },

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session rejected by the marketplace: {message}")]
    TokenRejected { message: String },

    #[error("access denied: {message}")]
    Forbidden { message: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("no authentication token available")]
    NoTokenAvailable,

    #[error("failed to retrieve stored token: {message}")]
    TokenRetrievalFailed { message: String },

    #[error("failed to store token: {message}")]
    TokenStorageFailed { message: String },

    #[error("secure storage error: {0}")]
    Secret(#[from] super::SecretError),

    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl ApiError {
    /// Creates invalid format error.
    #[must_use]
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidTokenFormat {
            reason: reason.into(),
        }
    }

    /// Creates token rejected error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::TokenRejected {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates retrieval failed error.
    #[must_use]
    pub fn retrieval_failed(message: impl Into<String>) -> Self {
        Self::TokenRetrievalFailed {
            message: message.into(),
        }
    }

    /// Creates storage failed error.
    #[must_use]
    pub fn storage_failed(message: impl Into<String>) -> Self {
        Self::TokenStorageFailed {
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether the user can simply try again.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::RateLimited { .. }
                | Self::Server { .. }
                | Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::InvalidCredentials
        )
    }

    /// Returns whether error is network related.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimited { .. })
    }

    /// Returns whether the session is no longer usable and the user must log in again.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::TokenRejected { .. } | Self::NoTokenAvailable)
    }

    /// Short text suitable for a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::TokenRejected { .. } => "Your session has expired, please log in again".to_string(),
            Self::Forbidden { .. } => "You are not allowed to do that".to_string(),
            Self::NotFound { resource } => format!("{resource} no longer exists"),
            Self::Validation { message } => message.clone(),
            Self::RateLimited { retry_after_ms } => {
                format!("Too many requests, try again in {}s", retry_after_ms.div_ceil(1000))
            }
            Self::Network { .. } => "Could not reach the marketplace".to_string(),
            Self::Server { .. } => "The marketplace had a problem, try again later".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ApiError::network("down").is_recoverable());
        assert!(ApiError::network("down").is_network_error());
        assert!(ApiError::rejected("expired").is_auth_failure());
        assert!(!ApiError::rejected("expired").is_recoverable());
        assert!(!ApiError::forbidden("admin only").is_auth_failure());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ApiError::RateLimited {
                retry_after_ms: 1500
            }
            .user_message(),
            "Too many requests, try again in 2s"
        );
        assert_eq!(
            ApiError::not_found("Listing").user_message(),
            "Listing no longer exists"
        );
        assert_eq!(
            ApiError::validation("Title is required").user_message(),
            "Title is required"
        );
    }
}
