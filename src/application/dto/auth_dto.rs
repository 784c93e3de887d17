//! Authentication DTOs.

use crate::domain::entities::{AuthToken, User};
use crate::domain::ports::Credentials;

/// Source of the authentication token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Token passed on the command line or via `BAZAAR_TOKEN`.
    CommandLine,
    /// Token from system keyring.
    Keyring,
    /// Token pasted into the login screen.
    UserInput,
    /// Token issued by an email and password login.
    Credentials,
}

impl TokenSource {
    /// Returns human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::CommandLine => "command line / environment",
            Self::Keyring => "system keyring",
            Self::UserInput => "user input",
            Self::Credentials => "email login",
        }
    }
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// How the user proves who they are.
#[derive(Debug, Clone)]
pub enum LoginMethod {
    Credentials(Credentials),
    Token(String),
}

/// Login request data.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub method: LoginMethod,
    pub source: TokenSource,
    /// Whether to persist the resulting token.
    pub persist_token: bool,
}

impl LoginRequest {
    /// Email and password login.
    #[must_use]
    pub fn credentials(credentials: Credentials) -> Self {
        Self {
            method: LoginMethod::Credentials(credentials),
            source: TokenSource::Credentials,
            persist_token: true,
        }
    }

    /// Login with an existing bearer token.
    #[must_use]
    pub fn token(token: String, source: TokenSource) -> Self {
        Self {
            method: LoginMethod::Token(token),
            source,
            persist_token: true,
        }
    }

    #[must_use]
    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist_token = persist;
        self
    }

    /// Disables token persistence.
    #[must_use]
    pub fn without_persistence(self) -> Self {
        self.with_persistence(false)
    }
}

/// Login response data.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Authenticated user.
    pub user: User,
    pub token: AuthToken,
    /// Token source used.
    pub token_source: TokenSource,
    /// Whether token was persisted.
    pub token_persisted: bool,
}
