//! Authentication port definition.

use std::fmt;

use async_trait::async_trait;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::entities::{AuthToken, User};
use crate::domain::errors::ApiError;

/// Password wrapper wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: Password,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: Password) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password,
        }
    }

    /// Checks the fields before any request is made.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }
        if !self.email.contains('@') {
            return Err(ApiError::validation("Enter a valid email address"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub credentials: Credentials,
}

/// Token and profile returned by login and registration.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: AuthToken,
    pub user: User,
}

/// Port for marketplace authentication operations.
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Exchanges credentials for a session.
    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError>;

    /// Creates an account and signs it in.
    async fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError>;

    /// Validates token and returns the current user.
    async fn validate_token(&self, token: &AuthToken) -> Result<User, ApiError>;

    /// Checks marketplace API availability.
    async fn health_check(&self) -> Result<(), ApiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    pub const MOCK_TOKEN: &str = "bz_live_mock_session_token_0001";

    /// Mock authentication port for testing.
    pub struct MockAuthPort {
        should_succeed: Arc<AtomicBool>,
        user: User,
    }

    impl MockAuthPort {
        /// Creates new mock.
        pub fn new(should_succeed: bool) -> Self {
            Self {
                should_succeed: Arc::new(AtomicBool::new(should_succeed)),
                user: User::new(1_u64, "Ada", "ada@example.com"),
            }
        }

        pub fn with_user(mut self, user: User) -> Self {
            self.user = user;
            self
        }

        /// Sets success behavior.
        pub fn set_should_succeed(&self, value: bool) {
            self.should_succeed.store(value, Ordering::SeqCst);
        }

        fn session(&self) -> AuthSession {
            AuthSession {
                token: AuthToken::new_unchecked(MOCK_TOKEN),
                user: self.user.clone(),
            }
        }
    }

    #[async_trait]
    impl AuthPort for MockAuthPort {
        async fn login(&self, _credentials: &Credentials) -> Result<AuthSession, ApiError> {
            if self.should_succeed.load(Ordering::SeqCst) {
                Ok(self.session())
            } else {
                Err(ApiError::InvalidCredentials)
            }
        }

        async fn register(&self, _registration: &Registration) -> Result<AuthSession, ApiError> {
            if self.should_succeed.load(Ordering::SeqCst) {
                Ok(self.session())
            } else {
                Err(ApiError::validation("Email already registered"))
            }
        }

        async fn validate_token(&self, _token: &AuthToken) -> Result<User, ApiError> {
            if self.should_succeed.load(Ordering::SeqCst) {
                Ok(self.user.clone())
            } else {
                Err(ApiError::rejected("mock rejection"))
            }
        }

        async fn health_check(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("ada@example.com", Password::new("pw")).validate().is_ok());
        assert!(Credentials::new("ada", Password::new("pw")).validate().is_err());
        assert!(Credentials::new(" ", Password::new("pw")).validate().is_err());
        assert!(Credentials::new("ada@example.com", Password::new("")).validate().is_err());
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let creds = Credentials::new("ada@example.com", Password::new("hunter2"));
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
