//! Token storage port definition.

use async_trait::async_trait;

use crate::domain::entities::AuthToken;
use crate::domain::errors::ApiError;

/// Port for token persistence operations.
#[async_trait]
pub trait TokenStoragePort: Send + Sync {
    /// Retrieves stored token.
    async fn get_token(&self) -> Result<Option<AuthToken>, ApiError>;

    /// Stores token securely.
    async fn store_token(&self, token: &AuthToken) -> Result<(), ApiError>;

    /// Deletes stored token.
    async fn delete_token(&self) -> Result<(), ApiError>;

    /// Checks if token exists.
    async fn has_token(&self) -> Result<bool, ApiError> {
        Ok(self.get_token().await?.is_some())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::RwLock;

    /// In-memory token storage that can be told to fail.
    #[derive(Default)]
    pub struct MockTokenStorage {
        token: Arc<RwLock<Option<AuthToken>>>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl MockTokenStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_token(token: AuthToken) -> Self {
            Self {
                token: Arc::new(RwLock::new(Some(token))),
                ..Self::default()
            }
        }

        pub fn failing_reads(self) -> Self {
            self.fail_reads.store(true, Ordering::SeqCst);
            self
        }

        pub fn failing_writes(self) -> Self {
            self.fail_writes.store(true, Ordering::SeqCst);
            self
        }

        pub async fn stored(&self) -> Option<AuthToken> {
            self.token.read().await.clone()
        }
    }

    #[async_trait]
    impl TokenStoragePort for MockTokenStorage {
        async fn get_token(&self) -> Result<Option<AuthToken>, ApiError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(ApiError::retrieval_failed("keyring locked"));
            }
            Ok(self.token.read().await.clone())
        }

        async fn store_token(&self, token: &AuthToken) -> Result<(), ApiError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(ApiError::storage_failed("keyring unavailable"));
            }
            *self.token.write().await = Some(token.clone());
            Ok(())
        }

        async fn delete_token(&self) -> Result<(), ApiError> {
            *self.token.write().await = None;
            Ok(())
        }
    }
}
