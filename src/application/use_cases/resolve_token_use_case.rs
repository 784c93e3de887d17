//! Token resolution use case.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::application::dto::TokenSource;
use crate::domain::entities::AuthToken;
use crate::domain::ports::TokenStoragePort;

/// Resolved token with its source.
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    /// The authentication token.
    pub token: AuthToken,
    /// Source of the token.
    pub source: TokenSource,
}

/// Resolves authentication token from available sources.
pub struct ResolveTokenUseCase {
    storage_port: Arc<dyn TokenStoragePort>,
}

impl ResolveTokenUseCase {
    /// Creates new use case.
    #[must_use]
    pub const fn new(storage_port: Arc<dyn TokenStoragePort>) -> Self {
        Self { storage_port }
    }

    /// Resolves token from keyring or CLI/Env.
    ///
    /// Priority:
    /// 1. Keyring
    /// 2. CLI/Env (passed as argument)
    ///
    /// Tokens whose JWT `exp` claim has passed are skipped. Keyring failures
    /// are logged and treated as an empty keyring.
    pub async fn execute(&self, cli_token: Option<String>) -> Option<ResolvedToken> {
        let now = Utc::now();

        debug!("Checking keyring for stored token");
        match self.storage_port.get_token().await {
            Ok(Some(token)) if token.is_expired(now) => {
                info!("Stored token has expired, ignoring it");
            }
            Ok(Some(token)) => {
                info!("Using token from system keyring");
                return Some(ResolvedToken {
                    token,
                    source: TokenSource::Keyring,
                });
            }
            Ok(None) => {
                debug!("No token found in keyring");
            }
            Err(e) => {
                warn!(error = %e, "Failed to check keyring");
            }
        }

        if let Some(token_str) = cli_token.filter(|s| !s.trim().is_empty()) {
            debug!("Checking command-line/env token");
            match AuthToken::new(token_str) {
                Some(token) if token.is_expired(now) => {
                    warn!("Command-line token has expired");
                }
                Some(token) => {
                    info!("Using token from command line / environment");
                    return Some(ResolvedToken {
                        token,
                        source: TokenSource::CommandLine,
                    });
                }
                None => debug!("Command-line token has invalid format"),
            }
        }

        debug!("No token found in any source");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockTokenStorage;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn make_valid_token() -> String {
        "bz_live_8f3c2a9d41e07b66c5d2".to_string()
    }

    fn make_expired_jwt() -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":1000}"#);
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[tokio::test]
    async fn test_keyring_priority() {
        let storage = Arc::new(MockTokenStorage::with_token(AuthToken::new_unchecked(
            make_valid_token(),
        )));
        let use_case = ResolveTokenUseCase::new(storage);

        let result = use_case
            .execute(Some("bz_live_cli_token_000000".to_string()))
            .await;

        assert_eq!(result.unwrap().source, TokenSource::Keyring);
    }

    #[tokio::test]
    async fn test_cli_fallback() {
        let use_case = ResolveTokenUseCase::new(Arc::new(MockTokenStorage::new()));

        let result = use_case.execute(Some(make_valid_token())).await;

        assert_eq!(result.unwrap().source, TokenSource::CommandLine);
    }

    #[tokio::test]
    async fn test_expired_keyring_token_falls_through() {
        let storage = Arc::new(MockTokenStorage::with_token(AuthToken::new_unchecked(
            make_expired_jwt(),
        )));
        let use_case = ResolveTokenUseCase::new(storage);

        let result = use_case.execute(Some(make_valid_token())).await.unwrap();

        assert_eq!(result.source, TokenSource::CommandLine);
    }

    #[tokio::test]
    async fn test_keyring_failure_does_not_abort() {
        let storage = Arc::new(MockTokenStorage::new().failing_reads());
        let use_case = ResolveTokenUseCase::new(storage);

        let result = use_case.execute(Some(make_valid_token())).await;

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_no_token_found() {
        let use_case = ResolveTokenUseCase::new(Arc::new(MockTokenStorage::new()));

        assert!(use_case.execute(None).await.is_none());
        assert!(use_case.execute(Some("  ".into())).await.is_none());
        assert!(use_case.execute(Some(make_expired_jwt())).await.is_none());
    }
}
