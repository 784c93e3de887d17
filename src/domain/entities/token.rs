//! Bearer token value object.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Marketplace API bearer token with validation and masking.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    value: String,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

impl AuthToken {
    const MIN_TOKEN_LENGTH: usize = 16;

    /// Creates new token with format validation.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();

        if value.len() < Self::MIN_TOKEN_LENGTH {
            return None;
        }

        if value.chars().any(char::is_whitespace) {
            return None;
        }

        Some(Self { value })
    }

    /// Creates token without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns token as string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Consumes token and returns inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.value
    }

    /// Returns masked token for display.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let visible_prefix: String = self.value.chars().take(4).collect();
        let suffix_start = self.value.chars().count().saturating_sub(4);
        let visible_suffix: String = self.value.chars().skip(suffix_start).collect();
        format!("{visible_prefix}...{visible_suffix}")
    }

    /// Expiry read from the `exp` claim when the token is a JWT.
    ///
    /// The signature is not checked; the backend stays authoritative.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let mut segments = self.value.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return None;
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        let claims: Claims = serde_json::from_slice(&bytes).ok()?;
        DateTime::from_timestamp(claims.exp?, 0)
    }

    /// Whether the token is known to be expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &self.masked())
            .finish()
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_valid_token() -> String {
        "bz_live_8f3c2a9d41e07b66c5d2".to_string()
    }

    fn make_jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"1","exp":{exp}}}"#));
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_valid_token_creation() {
        let token = AuthToken::new(make_valid_token());
        assert!(token.is_some());
    }

    #[test]
    fn test_invalid_token_too_short() {
        assert!(AuthToken::new("short").is_none());
    }

    #[test]
    fn test_invalid_token_with_whitespace() {
        assert!(AuthToken::new("abcdefgh ijklmnopqrs").is_none());
    }

    #[test]
    fn test_token_is_trimmed() {
        let token = AuthToken::new(format!("  {}\n", make_valid_token())).unwrap();
        assert_eq!(token.as_str(), make_valid_token());
    }

    #[test]
    fn test_token_masking() {
        let token = AuthToken::new_unchecked(make_valid_token());
        let masked = token.masked();

        assert_eq!(masked, "bz_l...c5d2");
        assert!(!masked.contains(&make_valid_token()));
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = AuthToken::new_unchecked(make_valid_token());
        let debug_output = format!("{token:?}");

        assert!(!debug_output.contains(&make_valid_token()));
    }

    #[test]
    fn test_jwt_expiry() {
        let now = Utc::now();
        let expired = AuthToken::new(make_jwt((now - Duration::hours(1)).timestamp())).unwrap();
        let fresh = AuthToken::new(make_jwt((now + Duration::hours(1)).timestamp())).unwrap();

        assert!(expired.is_expired(now));
        assert!(!fresh.is_expired(now));
        assert!(fresh.expires_at().is_some());
    }

    #[test]
    fn test_opaque_token_never_expires() {
        let token = AuthToken::new(make_valid_token()).unwrap();
        assert!(token.expires_at().is_none());
        assert!(!token.is_expired(Utc::now()));
    }
}
