//! Marketplace REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{
    AuthResponse, CreateListingBody, ErrorResponse, LoginBody, RegisterBody, SendMessageBody,
    StartConversationBody, UserStatusBody,
};
use crate::domain::entities::{
    AuthToken, BlogPost, Category, ChatMessage, Conversation, ConversationId, CreditAccount,
    DashboardStats, InboxNotification, Listing, ListingId, ModerationDecision, NotificationId,
    User, UserId, UserStatus,
};
use crate::domain::errors::ApiError;
use crate::domain::filters::ListingFilter;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{
    AuthPort, AuthSession, Credentials, MarketplaceDataPort, NewListing, Registration,
};

/// Default REST endpoint.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api/v1";
const USER_AGENT: &str = concat!("bazaar/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RETRY_AFTER_MS: u64 = 5000;

type Query = Vec<(&'static str, String)>;

/// HTTP adapter for both the auth and the data ports.
#[derive(Clone)]
pub struct MarketplaceClient {
    client: Client,
    base_url: String,
}

impl MarketplaceClient {
    /// Creates client for the given base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| ApiError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, token: Option<&AuthToken>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            warn!(path, error = %e, "Request to marketplace failed");
            map_transport_error(&e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after_ms = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(|seconds| seconds.saturating_mul(1000));
        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(ErrorResponse::into_message)
            .unwrap_or_else(|| format!("HTTP {status}"));

        debug!(path, status = status.as_u16(), %message, "Marketplace returned an error");
        Err(map_status(status, message, retry_after_ms, path == LOGIN_PATH))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response.json::<T>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse marketplace response");
            ApiError::decode(e.to_string())
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AuthToken,
        path: &str,
        query: &Query,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path, Some(token)).query(query);
        let response = self.send(builder, path).await?;
        Self::decode(response).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        token: Option<&AuthToken>,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let builder = self.request(method, path, token).json(body);
        let response = self.send(builder, path).await?;
        Self::decode(response).await
    }

    async fn send_empty(
        &self,
        method: Method,
        token: &AuthToken,
        path: &str,
    ) -> Result<(), ApiError> {
        let builder = self.request(method, path, Some(token));
        self.send(builder, path).await.map(drop)
    }
}

const LOGIN_PATH: &str = "auth/login";

fn map_transport_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::network("request timed out")
    } else if e.is_connect() {
        ApiError::network("failed to connect to the marketplace")
    } else if e.is_decode() {
        ApiError::decode(e.to_string())
    } else {
        ApiError::network(e.to_string())
    }
}

/// Maps an error status to the domain error.
fn map_status(
    status: StatusCode,
    message: String,
    retry_after_ms: Option<u64>,
    login: bool,
) -> ApiError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::validation(message),
        StatusCode::UNAUTHORIZED if login => ApiError::InvalidCredentials,
        StatusCode::UNAUTHORIZED => ApiError::rejected(message),
        StatusCode::FORBIDDEN => ApiError::forbidden(message),
        StatusCode::NOT_FOUND => ApiError::not_found(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
            retry_after_ms: retry_after_ms.unwrap_or(DEFAULT_RETRY_AFTER_MS),
        },
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            ApiError::network("marketplace is temporarily unavailable")
        }
        s if s.is_server_error() => ApiError::server(s.as_u16(), message),
        s => ApiError::unexpected(format!("unexpected response: {s} - {message}")),
    }
}

fn paged(page: PageRequest, mut extra: Query) -> Query {
    extra.extend(page.to_query_pairs());
    extra
}

#[async_trait]
impl AuthPort for MarketplaceClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        debug!("Logging in with email and password");
        let body = LoginBody {
            email: &credentials.email,
            password: credentials.password.expose(),
        };
        let response: AuthResponse = self
            .send_json(Method::POST, None, LOGIN_PATH, &body)
            .await?;
        let token = AuthToken::new(response.token)
            .ok_or_else(|| ApiError::decode("backend issued a malformed token"))?;
        Ok(AuthSession {
            token,
            user: response.user,
        })
    }

    async fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError> {
        registration.credentials.validate()?;
        let body = RegisterBody {
            name: registration.name.trim(),
            email: &registration.credentials.email,
            password: registration.credentials.password.expose(),
        };
        let response: AuthResponse = self
            .send_json(Method::POST, None, "auth/register", &body)
            .await?;
        let token = AuthToken::new(response.token)
            .ok_or_else(|| ApiError::decode("backend issued a malformed token"))?;
        Ok(AuthSession {
            token,
            user: response.user,
        })
    }

    async fn validate_token(&self, token: &AuthToken) -> Result<User, ApiError> {
        debug!("Validating token against marketplace API");
        let user: User = self.get_json(token, "users/me", &Vec::new()).await?;
        debug!(user_id = %user.id(), "Token validated successfully");
        Ok(user)
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        debug!("Performing marketplace health check");
        let builder = self.request(Method::GET, "health", None);
        self.send(builder, "health").await.map(drop)
    }
}

#[async_trait]
impl MarketplaceDataPort for MarketplaceClient {
    async fn fetch_categories(&self, token: &AuthToken) -> Result<Vec<Category>, ApiError> {
        self.get_json(token, "categories", &Vec::new()).await
    }

    async fn fetch_listings(
        &self,
        token: &AuthToken,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> Result<Page<Listing>, ApiError> {
        filter.validate()?;
        let query = paged(page, filter.to_query_pairs());
        debug!(page = page.page(), criteria = query.len(), "Fetching listings");
        self.get_json(token, "listings", &query).await
    }

    async fn fetch_listing(&self, token: &AuthToken, id: ListingId) -> Result<Listing, ApiError> {
        self.get_json(token, &format!("listings/{id}"), &Vec::new())
            .await
    }

    async fn create_listing(
        &self,
        token: &AuthToken,
        listing: &NewListing,
    ) -> Result<Listing, ApiError> {
        listing.validate()?;
        self.send_json(
            Method::POST,
            Some(token),
            "listings",
            &CreateListingBody::from(listing),
        )
        .await
    }

    async fn fetch_favorites(
        &self,
        token: &AuthToken,
        page: PageRequest,
    ) -> Result<Page<Listing>, ApiError> {
        let mut favorites: Page<Listing> = self
            .get_json(token, "favorites", &page.to_query_pairs())
            .await?;
        for listing in &mut favorites.items {
            listing.set_favorite(true);
        }
        Ok(favorites)
    }

    async fn add_favorite(&self, token: &AuthToken, id: ListingId) -> Result<(), ApiError> {
        self.send_empty(Method::PUT, token, &format!("favorites/{id}"))
            .await
    }

    async fn remove_favorite(&self, token: &AuthToken, id: ListingId) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, token, &format!("favorites/{id}"))
            .await
    }

    async fn fetch_conversations(
        &self,
        token: &AuthToken,
    ) -> Result<Vec<Conversation>, ApiError> {
        self.get_json(token, "conversations", &Vec::new()).await
    }

    async fn fetch_messages(
        &self,
        token: &AuthToken,
        conversation_id: ConversationId,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, ApiError> {
        self.get_json(
            token,
            &format!("conversations/{conversation_id}/messages"),
            &page.to_query_pairs(),
        )
        .await
    }

    async fn send_message(
        &self,
        token: &AuthToken,
        conversation_id: ConversationId,
        body: &str,
        client_nonce: &str,
    ) -> Result<ChatMessage, ApiError> {
        self.send_json(
            Method::POST,
            Some(token),
            &format!("conversations/{conversation_id}/messages"),
            &SendMessageBody { body, client_nonce },
        )
        .await
    }

    async fn start_conversation(
        &self,
        token: &AuthToken,
        listing_id: ListingId,
        body: &str,
    ) -> Result<Conversation, ApiError> {
        self.send_json(
            Method::POST,
            Some(token),
            "conversations",
            &StartConversationBody { listing_id, body },
        )
        .await
    }

    async fn mark_conversation_read(
        &self,
        token: &AuthToken,
        conversation_id: ConversationId,
    ) -> Result<(), ApiError> {
        self.send_empty(
            Method::POST,
            token,
            &format!("conversations/{conversation_id}/read"),
        )
        .await
    }

    async fn fetch_blog_posts(
        &self,
        token: &AuthToken,
        tag: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, ApiError> {
        let extra = tag.map(|tag| vec![("tag", tag.to_string())]).unwrap_or_default();
        self.get_json(token, "blog/posts", &paged(page, extra)).await
    }

    async fn fetch_blog_post(&self, token: &AuthToken, slug: &str) -> Result<BlogPost, ApiError> {
        self.get_json(token, &format!("blog/posts/{slug}"), &Vec::new())
            .await
    }

    async fn fetch_notifications(
        &self,
        token: &AuthToken,
        page: PageRequest,
    ) -> Result<Page<InboxNotification>, ApiError> {
        self.get_json(token, "notifications", &page.to_query_pairs())
            .await
    }

    async fn mark_notification_read(
        &self,
        token: &AuthToken,
        id: NotificationId,
    ) -> Result<(), ApiError> {
        self.send_empty(Method::POST, token, &format!("notifications/{id}/read"))
            .await
    }

    async fn mark_all_notifications_read(&self, token: &AuthToken) -> Result<(), ApiError> {
        self.send_empty(Method::POST, token, "notifications/read-all")
            .await
    }

    async fn fetch_credits(&self, token: &AuthToken) -> Result<CreditAccount, ApiError> {
        self.get_json(token, "credits", &Vec::new()).await
    }

    async fn fetch_admin_stats(&self, token: &AuthToken) -> Result<DashboardStats, ApiError> {
        self.get_json(token, "admin/stats", &Vec::new()).await
    }

    async fn fetch_admin_users(
        &self,
        token: &AuthToken,
        query: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, ApiError> {
        let extra = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| vec![("q", q.to_string())])
            .unwrap_or_default();
        self.get_json(token, "admin/users", &paged(page, extra)).await
    }

    async fn set_user_status(
        &self,
        token: &AuthToken,
        id: UserId,
        status: UserStatus,
    ) -> Result<User, ApiError> {
        self.send_json(
            Method::PATCH,
            Some(token),
            &format!("admin/users/{id}"),
            &UserStatusBody { status },
        )
        .await
    }

    async fn fetch_moderation_queue(
        &self,
        token: &AuthToken,
        page: PageRequest,
    ) -> Result<Page<Listing>, ApiError> {
        let query = paged(page, vec![("status", "pending".to_string())]);
        self.get_json(token, "admin/listings", &query).await
    }

    async fn moderate_listing(
        &self,
        token: &AuthToken,
        id: ListingId,
        decision: &ModerationDecision,
    ) -> Result<(), ApiError> {
        let path = format!("admin/listings/{id}/moderation");
        let builder = self
            .request(Method::POST, &path, Some(token))
            .json(decision);
        self.send(builder, &path).await.map(drop)
    }
}
