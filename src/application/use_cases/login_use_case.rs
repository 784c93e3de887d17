//! Login use case implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::{LoginMethod, LoginRequest, LoginResponse};
use crate::domain::entities::AuthToken;
use crate::domain::errors::ApiError;
use crate::domain::ports::{AuthPort, AuthSession, TokenStoragePort};

/// Handles user authentication workflow.
#[derive(Clone)]
pub struct LoginUseCase {
    auth_port: Arc<dyn AuthPort>,
    storage_port: Arc<dyn TokenStoragePort>,
}

impl LoginUseCase {
    /// Creates new login use case.
    #[must_use]
    pub const fn new(
        auth_port: Arc<dyn AuthPort>,
        storage_port: Arc<dyn TokenStoragePort>,
    ) -> Self {
        Self {
            auth_port,
            storage_port,
        }
    }

    /// Executes login with provided request.
    ///
    /// # Errors
    /// Returns error if the credentials or token are invalid or rejected.
    pub async fn execute(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        debug!(source = %request.source, "Attempting login");

        let AuthSession { token, user } = match &request.method {
            LoginMethod::Credentials(credentials) => {
                credentials.validate()?;
                self.auth_port.login(credentials).await.map_err(|e| {
                    warn!(error = %e, "Credential login failed");
                    e
                })?
            }
            LoginMethod::Token(raw) => {
                let token = AuthToken::new(raw.as_str()).ok_or_else(|| {
                    warn!("Invalid token format provided");
                    ApiError::invalid_format("token is too short or contains whitespace")
                })?;

                debug!("Token format validated, checking with marketplace API");
                let user = self.auth_port.validate_token(&token).await.map_err(|e| {
                    warn!(error = %e, "Token validation failed");
                    e
                })?;
                AuthSession { token, user }
            }
        };

        info!(
            user_id = %user.id(),
            role = ?user.role(),
            "Successfully authenticated"
        );

        let token_persisted = if request.persist_token {
            match self.storage_port.store_token(&token).await {
                Ok(()) => {
                    info!("Token persisted to secure storage");
                    true
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to persist token to secure storage");
                    false
                }
            }
        } else {
            debug!("Token persistence disabled, skipping storage");
            false
        };

        Ok(LoginResponse {
            user,
            token,
            token_source: request.source,
            token_persisted,
        })
    }

    /// Deletes the stored token.
    ///
    /// # Errors
    /// Returns error if deletion fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        debug!("Deleting token from secure storage");
        match self.storage_port.delete_token().await {
            Ok(()) => {
                info!("Token deleted from secure storage");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to delete token from secure storage");
                Err(e)
            }
        }
    }
}
