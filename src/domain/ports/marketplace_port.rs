//! Marketplace data port for listings, messaging, blog, inbox and admin data.

use async_trait::async_trait;

use crate::domain::entities::{
    AuthToken, BlogPost, Category, CategoryId, ChatMessage, Conversation, ConversationId,
    CreditAccount, DashboardStats, InboxNotification, Listing, ListingId, ModerationDecision,
    Money, NotificationId, User, UserId, UserStatus,
};
use crate::domain::errors::ApiError;
use crate::domain::filters::ListingFilter;
use crate::domain::pagination::{Page, PageRequest};

/// Fields for a new listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub category_id: Option<CategoryId>,
    pub location: Option<String>,
}

impl NewListing {
    #[must_use]
    pub fn new(title: impl Into<String>, price: Money) -> Self {
        Self {
            title: title.into().trim().to_string(),
            description: String::new(),
            price,
            category_id: None,
            location: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.is_empty() {
            return Err(ApiError::validation("Title is required"));
        }
        if self.price.cents() < 0 {
            return Err(ApiError::validation("Price cannot be negative"));
        }
        Ok(())
    }
}

/// Port for fetching and mutating marketplace data.
#[async_trait]
pub trait MarketplaceDataPort: Send + Sync {
    async fn fetch_categories(&self, token: &AuthToken) -> Result<Vec<Category>, ApiError>;

    /// Fetches one page of listings matching the filter.
    async fn fetch_listings(
        &self,
        token: &AuthToken,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> Result<Page<Listing>, ApiError>;

    async fn fetch_listing(&self, token: &AuthToken, id: ListingId) -> Result<Listing, ApiError>;

    async fn create_listing(
        &self,
        token: &AuthToken,
        listing: &NewListing,
    ) -> Result<Listing, ApiError>;

    async fn fetch_favorites(
        &self,
        token: &AuthToken,
        page: PageRequest,
    ) -> Result<Page<Listing>, ApiError>;

    async fn add_favorite(&self, token: &AuthToken, id: ListingId) -> Result<(), ApiError>;

    async fn remove_favorite(&self, token: &AuthToken, id: ListingId) -> Result<(), ApiError>;

    async fn fetch_conversations(&self, token: &AuthToken)
    -> Result<Vec<Conversation>, ApiError>;

    /// Fetches a page of messages, newest first.
    async fn fetch_messages(
        &self,
        token: &AuthToken,
        conversation_id: ConversationId,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, ApiError>;

    /// Sends a message; the backend echoes `client_nonce` on the result.
    async fn send_message(
        &self,
        token: &AuthToken,
        conversation_id: ConversationId,
        body: &str,
        client_nonce: &str,
    ) -> Result<ChatMessage, ApiError>;

    /// Opens a conversation with the seller of a listing.
    async fn start_conversation(
        &self,
        token: &AuthToken,
        listing_id: ListingId,
        body: &str,
    ) -> Result<Conversation, ApiError>;

    async fn mark_conversation_read(
        &self,
        token: &AuthToken,
        conversation_id: ConversationId,
    ) -> Result<(), ApiError>;

    async fn fetch_blog_posts(
        &self,
        token: &AuthToken,
        tag: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, ApiError>;

    async fn fetch_blog_post(&self, token: &AuthToken, slug: &str) -> Result<BlogPost, ApiError>;

    async fn fetch_notifications(
        &self,
        token: &AuthToken,
        page: PageRequest,
    ) -> Result<Page<InboxNotification>, ApiError>;

    async fn mark_notification_read(
        &self,
        token: &AuthToken,
        id: NotificationId,
    ) -> Result<(), ApiError>;

    async fn mark_all_notifications_read(&self, token: &AuthToken) -> Result<(), ApiError>;

    async fn fetch_credits(&self, token: &AuthToken) -> Result<CreditAccount, ApiError>;

    async fn fetch_admin_stats(&self, token: &AuthToken) -> Result<DashboardStats, ApiError>;

    async fn fetch_admin_users(
        &self,
        token: &AuthToken,
        query: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, ApiError>;

    async fn set_user_status(
        &self,
        token: &AuthToken,
        id: UserId,
        status: UserStatus,
    ) -> Result<User, ApiError>;

    /// Fetches listings awaiting moderation.
    async fn fetch_moderation_queue(
        &self,
        token: &AuthToken,
        page: PageRequest,
    ) -> Result<Page<Listing>, ApiError>;

    async fn moderate_listing(
        &self,
        token: &AuthToken,
        id: ListingId,
        decision: &ModerationDecision,
    ) -> Result<(), ApiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    /// In-memory marketplace backend.
    ///
    /// Favorite and message calls are recorded; `fail_writes` makes every
    /// mutating call return a network error.
    #[derive(Default)]
    pub struct MockMarketplace {
        pub categories: Vec<Category>,
        pub listings: Vec<Listing>,
        pub conversations: Vec<Conversation>,
        pub messages: Vec<ChatMessage>,
        pub posts: Vec<BlogPost>,
        pub notifications: Vec<InboxNotification>,
        pub credits: CreditAccount,
        pub stats: DashboardStats,
        pub users: Vec<User>,
        pub favorite_calls: Mutex<Vec<(ListingId, bool)>>,
        pub sent_messages: Mutex<Vec<(ConversationId, String)>>,
        pub read_conversations: Mutex<Vec<ConversationId>>,
        pub moderation_calls: Mutex<Vec<(ListingId, ModerationDecision)>>,
        pub listing_requests: Mutex<Vec<(ListingFilter, PageRequest)>>,
        fail_writes: AtomicBool,
        next_id: AtomicU64,
    }

    impl MockMarketplace {
        pub fn new() -> Self {
            Self {
                next_id: AtomicU64::new(1000),
                ..Self::default()
            }
        }

        pub fn set_fail_writes(&self, value: bool) {
            self.fail_writes.store(value, Ordering::SeqCst);
        }

        fn check_write(&self) -> Result<(), ApiError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(ApiError::network("mock backend offline"))
            } else {
                Ok(())
            }
        }

        fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
            let start = ((page.page() - 1) * page.per_page()) as usize;
            let slice: Vec<T> = items
                .iter()
                .skip(start)
                .take(page.per_page() as usize)
                .cloned()
                .collect();
            Page::new(slice, page.page(), page.per_page(), Some(items.len() as u64))
        }
    }

    #[async_trait]
    impl MarketplaceDataPort for MockMarketplace {
        async fn fetch_categories(&self, _token: &AuthToken) -> Result<Vec<Category>, ApiError> {
            Ok(self.categories.clone())
        }

        async fn fetch_listings(
            &self,
            _token: &AuthToken,
            filter: &ListingFilter,
            page: PageRequest,
        ) -> Result<Page<Listing>, ApiError> {
            self.listing_requests
                .lock()
                .unwrap()
                .push((filter.clone(), page));
            Ok(Self::paginate(&self.listings, page))
        }

        async fn fetch_listing(
            &self,
            _token: &AuthToken,
            id: ListingId,
        ) -> Result<Listing, ApiError> {
            self.listings
                .iter()
                .find(|l| l.id() == id)
                .cloned()
                .ok_or_else(|| ApiError::not_found("Listing"))
        }

        async fn create_listing(
            &self,
            _token: &AuthToken,
            listing: &NewListing,
        ) -> Result<Listing, ApiError> {
            self.check_write()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(Listing::new(
                id,
                listing.title.clone(),
                &listing.price,
                crate::domain::entities::SellerSummary {
                    id: UserId(1),
                    name: "Ada".into(),
                },
                Utc::now(),
            ))
        }

        async fn fetch_favorites(
            &self,
            _token: &AuthToken,
            page: PageRequest,
        ) -> Result<Page<Listing>, ApiError> {
            let favorites: Vec<Listing> = self
                .listings
                .iter()
                .filter(|l| l.is_favorite())
                .cloned()
                .collect();
            Ok(Self::paginate(&favorites, page))
        }

        async fn add_favorite(&self, _token: &AuthToken, id: ListingId) -> Result<(), ApiError> {
            self.favorite_calls.lock().unwrap().push((id, true));
            self.check_write()
        }

        async fn remove_favorite(&self, _token: &AuthToken, id: ListingId) -> Result<(), ApiError> {
            self.favorite_calls.lock().unwrap().push((id, false));
            self.check_write()
        }

        async fn fetch_conversations(
            &self,
            _token: &AuthToken,
        ) -> Result<Vec<Conversation>, ApiError> {
            Ok(self.conversations.clone())
        }

        async fn fetch_messages(
            &self,
            _token: &AuthToken,
            conversation_id: ConversationId,
            page: PageRequest,
        ) -> Result<Page<ChatMessage>, ApiError> {
            let mut messages: Vec<ChatMessage> = self
                .messages
                .iter()
                .filter(|m| m.conversation_id() == conversation_id)
                .cloned()
                .collect();
            messages.sort_by_key(|m| std::cmp::Reverse(m.sent_at()));
            Ok(Self::paginate(&messages, page))
        }

        async fn send_message(
            &self,
            _token: &AuthToken,
            conversation_id: ConversationId,
            body: &str,
            client_nonce: &str,
        ) -> Result<ChatMessage, ApiError> {
            self.sent_messages
                .lock()
                .unwrap()
                .push((conversation_id, body.to_string()));
            self.check_write()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(
                ChatMessage::new(id, conversation_id, UserId(1), body, Utc::now())
                    .with_nonce(client_nonce),
            )
        }

        async fn start_conversation(
            &self,
            _token: &AuthToken,
            listing_id: ListingId,
            body: &str,
        ) -> Result<Conversation, ApiError> {
            self.check_write()?;
            let listing = self
                .listings
                .iter()
                .find(|l| l.id() == listing_id)
                .ok_or_else(|| ApiError::not_found("Listing"))?;
            let id = ConversationId(self.next_id.fetch_add(1, Ordering::SeqCst));
            let mut conversation = Conversation::new(
                id,
                crate::domain::entities::Participant {
                    id: listing.seller().id,
                    name: listing.seller().name.clone(),
                },
                Utc::now(),
            );
            conversation.record_message(
                ChatMessage::new(
                    self.next_id.fetch_add(1, Ordering::SeqCst),
                    id,
                    UserId(1),
                    body,
                    Utc::now(),
                ),
                UserId(1),
            );
            Ok(conversation)
        }

        async fn mark_conversation_read(
            &self,
            _token: &AuthToken,
            conversation_id: ConversationId,
        ) -> Result<(), ApiError> {
            self.read_conversations.lock().unwrap().push(conversation_id);
            self.check_write()
        }

        async fn fetch_blog_posts(
            &self,
            _token: &AuthToken,
            tag: Option<&str>,
            page: PageRequest,
        ) -> Result<Page<BlogPost>, ApiError> {
            let posts: Vec<BlogPost> = self
                .posts
                .iter()
                .filter(|p| tag.is_none_or(|tag| p.tags().iter().any(|t| t == tag)))
                .cloned()
                .collect();
            Ok(Self::paginate(&posts, page))
        }

        async fn fetch_blog_post(&self, _token: &AuthToken, slug: &str) -> Result<BlogPost, ApiError> {
            self.posts
                .iter()
                .find(|p| p.slug() == slug)
                .cloned()
                .ok_or_else(|| ApiError::not_found("Post"))
        }

        async fn fetch_notifications(
            &self,
            _token: &AuthToken,
            page: PageRequest,
        ) -> Result<Page<InboxNotification>, ApiError> {
            Ok(Self::paginate(&self.notifications, page))
        }

        async fn mark_notification_read(
            &self,
            _token: &AuthToken,
            _id: NotificationId,
        ) -> Result<(), ApiError> {
            self.check_write()
        }

        async fn mark_all_notifications_read(&self, _token: &AuthToken) -> Result<(), ApiError> {
            self.check_write()
        }

        async fn fetch_credits(&self, _token: &AuthToken) -> Result<CreditAccount, ApiError> {
            Ok(self.credits.clone())
        }

        async fn fetch_admin_stats(&self, _token: &AuthToken) -> Result<DashboardStats, ApiError> {
            Ok(self.stats.clone())
        }

        async fn fetch_admin_users(
            &self,
            _token: &AuthToken,
            _query: Option<&str>,
            page: PageRequest,
        ) -> Result<Page<User>, ApiError> {
            Ok(Self::paginate(&self.users, page))
        }

        async fn set_user_status(
            &self,
            _token: &AuthToken,
            id: UserId,
            status: UserStatus,
        ) -> Result<User, ApiError> {
            self.check_write()?;
            let mut user = self
                .users
                .iter()
                .find(|u| u.id() == id)
                .cloned()
                .ok_or_else(|| ApiError::not_found("User"))?;
            user.set_status(status);
            Ok(user)
        }

        async fn fetch_moderation_queue(
            &self,
            _token: &AuthToken,
            page: PageRequest,
        ) -> Result<Page<Listing>, ApiError> {
            let pending: Vec<Listing> = self
                .listings
                .iter()
                .filter(|l| l.status() == crate::domain::entities::ListingStatus::Pending)
                .cloned()
                .collect();
            Ok(Self::paginate(&pending, page))
        }

        async fn moderate_listing(
            &self,
            _token: &AuthToken,
            id: ListingId,
            decision: &ModerationDecision,
        ) -> Result<(), ApiError> {
            self.moderation_calls
                .lock()
                .unwrap()
                .push((id, decision.clone()));
            self.check_write()
        }
    }
}
