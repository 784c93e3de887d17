//! Keyring-based token storage.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::entities::AuthToken;
use crate::domain::errors::ApiError;
use crate::domain::errors::SecretError;
use crate::domain::ports::TokenStoragePort;

const KEYRING_SERVICE: &str = "bazaar";
const KEYRING_USER: &str = "token";

/// System keyring token storage adapter.
///
/// Without the `keyring` feature nothing is stored or read, and `store_token`
/// reports the storage as unavailable.
pub struct KeyringTokenStorage {
    service: String,
    user: String,
}

impl KeyringTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::with_names(KEYRING_SERVICE, KEYRING_USER)
    }

    #[must_use]
    pub fn with_names(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    #[cfg(feature = "keyring")]
    fn entry(&self) -> Result<keyring::Entry, SecretError> {
        keyring::Entry::new(&self.service, &self.user)
            .map_err(|e| SecretError::AccessFailed(e.to_string()))
    }
}

impl Default for KeyringTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "keyring")]
#[async_trait]
impl TokenStoragePort for KeyringTokenStorage {
    async fn get_token(&self) -> Result<Option<AuthToken>, ApiError> {
        debug!(service = %self.service, "Retrieving token from keyring");

        match self.entry()?.get_password() {
            Ok(password) => {
                debug!("Token found in keyring");
                Ok(AuthToken::new(password))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No token stored in keyring");
                Ok(None)
            }
            Err(keyring::Error::NoStorageAccess(e) | keyring::Error::PlatformFailure(e)) => {
                warn!(error = %e, "Keyring is not available");
                Err(SecretError::NotAvailable(e.to_string()).into())
            }
            Err(e) => {
                warn!(error = %e, "Failed to retrieve token from keyring");
                Err(SecretError::RetrievalFailed(e.to_string()).into())
            }
        }
    }

    async fn store_token(&self, token: &AuthToken) -> Result<(), ApiError> {
        debug!(service = %self.service, "Storing token in keyring");

        self.entry()?.set_password(token.as_str()).map_err(|e| {
            warn!(error = %e, "Failed to store token in keyring");
            SecretError::StorageFailed(e.to_string())
        })?;

        debug!("Token stored successfully");
        Ok(())
    }

    async fn delete_token(&self) -> Result<(), ApiError> {
        debug!(service = %self.service, "Deleting token from keyring");

        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!("Token removed from keyring");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to delete token from keyring");
                Err(SecretError::DeletionFailed(e.to_string()).into())
            }
        }
    }
}

#[cfg(not(feature = "keyring"))]
#[async_trait]
impl TokenStoragePort for KeyringTokenStorage {
    async fn get_token(&self) -> Result<Option<AuthToken>, ApiError> {
        debug!(service = %self.service, user = %self.user, "Keyring feature disabled, no stored token");
        Ok(None)
    }

    async fn store_token(&self, _token: &AuthToken) -> Result<(), ApiError> {
        warn!("Keyring feature disabled, token not persisted");
        Err(SecretError::NotAvailable("built without keyring support".to_string()).into())
    }

    async fn delete_token(&self) -> Result<(), ApiError> {
        Ok(())
    }
}


#[cfg(all(test, feature = "keyring"))]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires system keyring"]
    async fn test_store_and_retrieve_token() {
        let storage = KeyringTokenStorage::with_names("bazaar-test", "test-token");
        let token = AuthToken::new_unchecked("bz_live_8f3c2a9d41e07b66c5d2");

        storage.store_token(&token).await.unwrap();

        let retrieved = storage.get_token().await.unwrap();
        assert_eq!(retrieved.map(AuthToken::into_inner), Some(token.as_str().to_string()));

        storage.delete_token().await.unwrap();
        assert!(!storage.has_token().await.unwrap());
    }
}
