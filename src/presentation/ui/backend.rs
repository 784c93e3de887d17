use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::dto::LoginResponse;
use crate::application::services::{CommitOutcome, FavoritesService};
use crate::domain::entities::{
    AuthToken, BlogPost, Category, ChatMessage, Conversation, ConversationId, CreditAccount,
    DashboardStats, InboxNotification, Listing, ListingId, ModerationDecision, NotificationId,
    User, UserId, UserStatus,
};
use crate::domain::errors::ApiError;
use crate::domain::favorites::FavoriteIntent;
use crate::domain::filters::ListingFilter;
use crate::domain::pagination::{Generation, Page, PageRequest};
use crate::domain::ports::MarketplaceDataPort;

type ApiResult<T> = Result<T, ApiError>;

/// Everything the market screen needs before it is shown.
///
/// A failed fetch leaves its slot empty and is listed in `errors`.
#[derive(Debug, Default)]
pub struct InitialData {
    pub categories: Vec<Category>,
    pub listings: Option<(Generation, Page<Listing>)>,
    pub conversations: Vec<Conversation>,
    pub credits: Option<CreditAccount>,
    pub notifications: Option<(Generation, Page<InboxNotification>)>,
    pub admin_stats: Option<DashboardStats>,
    pub errors: Vec<(&'static str, ApiError)>,
}

impl InitialData {
    fn collect<T>(&mut self, what: &'static str, result: ApiResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!(error = %e, what, "Failed to load initial data");
                self.errors.push((what, e));
                None
            }
        }
    }
}

#[derive(Debug)]
pub enum Action {
    LoginFinished(ApiResult<LoginResponse>),
    InitialDataLoaded(Box<InitialData>),
    ListingsLoaded {
        generation: Generation,
        result: ApiResult<Page<Listing>>,
    },
    ListingLoaded(ApiResult<Listing>),
    FavoritesLoaded {
        generation: Generation,
        result: ApiResult<Page<Listing>>,
    },
    FavoriteCommitted {
        intent: FavoriteIntent,
        outcome: CommitOutcome,
    },
    ConversationsLoaded(ApiResult<Vec<Conversation>>),
    MessagesLoaded {
        conversation_id: ConversationId,
        result: ApiResult<Page<ChatMessage>>,
    },
    MessageSent {
        conversation_id: ConversationId,
        nonce: String,
        result: ApiResult<ChatMessage>,
    },
    ConversationStarted {
        listing_id: ListingId,
        result: ApiResult<Conversation>,
    },
    BlogPostsLoaded {
        generation: Generation,
        result: ApiResult<Page<BlogPost>>,
    },
    BlogPostLoaded(ApiResult<BlogPost>),
    NotificationsLoaded {
        generation: Generation,
        result: ApiResult<Page<InboxNotification>>,
    },
    /// `id` is `None` after marking everything read.
    NotificationsMarkedRead {
        id: Option<NotificationId>,
        result: ApiResult<()>,
    },
    CreditsLoaded(ApiResult<CreditAccount>),
    AdminStatsLoaded(ApiResult<DashboardStats>),
    AdminUsersLoaded {
        generation: Generation,
        result: ApiResult<Page<User>>,
    },
    UserStatusChanged {
        user_id: UserId,
        result: ApiResult<User>,
    },
    ModerationQueueLoaded {
        generation: Generation,
        result: ApiResult<Page<Listing>>,
    },
    ListingModerated {
        listing_id: ListingId,
        decision: ModerationDecision,
        result: ApiResult<()>,
    },
}

impl Action {
    /// Error carried by the action, if the request behind it failed.
    #[must_use]
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::LoginFinished(result) => result.as_ref().err(),
            Self::InitialDataLoaded(data) => data
                .errors
                .iter()
                .map(|(_, e)| e)
                .find(|e| e.is_auth_failure())
                .or_else(|| data.errors.first().map(|(_, e)| e)),
            Self::ListingsLoaded { result, .. }
            | Self::FavoritesLoaded { result, .. }
            | Self::ModerationQueueLoaded { result, .. } => result.as_ref().err(),
            Self::ListingLoaded(result) => result.as_ref().err(),
            Self::FavoriteCommitted { outcome, .. } => match outcome {
                CommitOutcome::RolledBack(e) => Some(e),
                CommitOutcome::Confirmed | CommitOutcome::Stale => None,
            },
            Self::ConversationsLoaded(result) => result.as_ref().err(),
            Self::MessagesLoaded { result, .. } => result.as_ref().err(),
            Self::MessageSent { result, .. } => result.as_ref().err(),
            Self::ConversationStarted { result, .. } => result.as_ref().err(),
            Self::BlogPostsLoaded { result, .. } => result.as_ref().err(),
            Self::BlogPostLoaded(result) => result.as_ref().err(),
            Self::NotificationsLoaded { result, .. } => result.as_ref().err(),
            Self::NotificationsMarkedRead { result, .. }
            | Self::ListingModerated { result, .. } => result.as_ref().err(),
            Self::CreditsLoaded(result) => result.as_ref().err(),
            Self::AdminStatsLoaded(result) => result.as_ref().err(),
            Self::AdminUsersLoaded { result, .. } => result.as_ref().err(),
            Self::UserStatusChanged { result, .. } => result.as_ref().err(),
        }
    }

    /// Whether the session is gone and the app must return to login.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        !matches!(self, Self::LoginFinished(_)) && self.error().is_some_and(ApiError::is_auth_failure)
    }
}

#[derive(Debug)]
pub enum BackendCommand {
    LoadInitialData {
        filter: ListingFilter,
        listings: (Generation, PageRequest),
        notifications: (Generation, PageRequest),
        include_admin: bool,
    },
    LoadListings {
        filter: ListingFilter,
        generation: Generation,
        page: PageRequest,
    },
    LoadListing(ListingId),
    LoadFavorites {
        generation: Generation,
        page: PageRequest,
    },
    CommitFavorite(FavoriteIntent),
    LoadConversations,
    LoadMessages {
        conversation_id: ConversationId,
        page: PageRequest,
    },
    SendMessage {
        conversation_id: ConversationId,
        body: String,
        nonce: String,
    },
    StartConversation {
        listing_id: ListingId,
        body: String,
    },
    MarkConversationRead(ConversationId),
    LoadBlogPosts {
        generation: Generation,
        page: PageRequest,
    },
    LoadBlogPost(String),
    LoadNotifications {
        generation: Generation,
        page: PageRequest,
    },
    MarkNotificationRead(NotificationId),
    MarkAllNotificationsRead,
    LoadCredits,
    LoadAdminStats,
    LoadAdminUsers {
        generation: Generation,
        page: PageRequest,
    },
    SetUserStatus {
        user_id: UserId,
        status: UserStatus,
    },
    LoadModerationQueue {
        generation: Generation,
        page: PageRequest,
    },
    ModerateListing {
        listing_id: ListingId,
        decision: ModerationDecision,
    },
}

/// Session worker. Commands run one at a time in arrival order; each answers
/// with an [`Action`].
pub struct Backend {
    marketplace: Arc<dyn MarketplaceDataPort>,
    favorites: FavoritesService,
    token: AuthToken,
    command_rx: mpsc::UnboundedReceiver<BackendCommand>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl Backend {
    pub fn new(
        marketplace: Arc<dyn MarketplaceDataPort>,
        favorites: FavoritesService,
        token: AuthToken,
        command_rx: mpsc::UnboundedReceiver<BackendCommand>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            marketplace,
            favorites,
            token,
            command_rx,
            action_tx,
        }
    }

    pub async fn run(mut self) {
        info!("Backend worker started");
        while let Some(command) = self.command_rx.recv().await {
            let action = self.handle_command(command).await;
            if let Some(action) = action
                && self.action_tx.send(action).is_err()
            {
                debug!("Action receiver dropped, stopping backend");
                break;
            }
        }
        info!("Backend worker stopped");
    }

    #[allow(clippy::too_many_lines)]
    async fn handle_command(&self, command: BackendCommand) -> Option<Action> {
        let port = &self.marketplace;
        let token = &self.token;

        let action = match command {
            BackendCommand::LoadInitialData {
                filter,
                listings,
                notifications,
                include_admin,
            } => {
                let data = self
                    .load_initial_data(&filter, listings, notifications, include_admin)
                    .await;
                Action::InitialDataLoaded(Box::new(data))
            }
            BackendCommand::LoadListings {
                filter,
                generation,
                page,
            } => {
                let result = port.fetch_listings(token, &filter, page).await;
                match &result {
                    Ok(p) => {
                        debug!(page = page.page(), count = p.items.len(), "Loaded listings");
                        self.favorites.sync_from(&p.items);
                    }
                    Err(e) => warn!(page = page.page(), error = %e, "Failed to load listings"),
                }
                Action::ListingsLoaded { generation, result }
            }
            BackendCommand::LoadListing(id) => {
                let result = port.fetch_listing(token, id).await;
                if let Err(e) = &result {
                    warn!(listing_id = %id, error = %e, "Failed to load listing");
                }
                Action::ListingLoaded(result)
            }
            BackendCommand::LoadFavorites { generation, page } => {
                let result = port.fetch_favorites(token, page).await;
                match &result {
                    Ok(p) => self.favorites.sync_from(&p.items),
                    Err(e) => warn!(error = %e, "Failed to load favorites"),
                }
                Action::FavoritesLoaded { generation, result }
            }
            BackendCommand::CommitFavorite(intent) => {
                let outcome = self.favorites.commit(token, intent).await;
                Action::FavoriteCommitted { intent, outcome }
            }
            BackendCommand::LoadConversations => {
                let result = port.fetch_conversations(token).await;
                if let Err(e) = &result {
                    warn!(error = %e, "Failed to load conversations");
                }
                Action::ConversationsLoaded(result)
            }
            BackendCommand::LoadMessages {
                conversation_id,
                page,
            } => {
                let result = port.fetch_messages(token, conversation_id, page).await;
                if let Err(e) = &result {
                    warn!(conversation_id = %conversation_id, error = %e, "Failed to load messages");
                }
                Action::MessagesLoaded {
                    conversation_id,
                    result,
                }
            }
            BackendCommand::SendMessage {
                conversation_id,
                body,
                nonce,
            } => {
                let result = port
                    .send_message(token, conversation_id, &body, &nonce)
                    .await;
                if let Err(e) = &result {
                    warn!(conversation_id = %conversation_id, error = %e, "Failed to send message");
                }
                Action::MessageSent {
                    conversation_id,
                    nonce,
                    result,
                }
            }
            BackendCommand::StartConversation { listing_id, body } => {
                let result = port.start_conversation(token, listing_id, &body).await;
                if let Err(e) = &result {
                    warn!(listing_id = %listing_id, error = %e, "Failed to contact seller");
                }
                Action::ConversationStarted { listing_id, result }
            }
            BackendCommand::MarkConversationRead(conversation_id) => {
                if let Err(e) = port.mark_conversation_read(token, conversation_id).await {
                    warn!(conversation_id = %conversation_id, error = %e, "Failed to mark conversation read");
                }
                return None;
            }
            BackendCommand::LoadBlogPosts { generation, page } => {
                let result = port.fetch_blog_posts(token, None, page).await;
                if let Err(e) = &result {
                    warn!(error = %e, "Failed to load blog posts");
                }
                Action::BlogPostsLoaded { generation, result }
            }
            BackendCommand::LoadBlogPost(slug) => {
                let result = port.fetch_blog_post(token, &slug).await;
                if let Err(e) = &result {
                    warn!(slug = %slug, error = %e, "Failed to load blog post");
                }
                Action::BlogPostLoaded(result)
            }
            BackendCommand::LoadNotifications { generation, page } => {
                let result = port.fetch_notifications(token, page).await;
                if let Err(e) = &result {
                    warn!(error = %e, "Failed to load notifications");
                }
                Action::NotificationsLoaded { generation, result }
            }
            BackendCommand::MarkNotificationRead(id) => {
                let result = port.mark_notification_read(token, id).await;
                Action::NotificationsMarkedRead {
                    id: Some(id),
                    result,
                }
            }
            BackendCommand::MarkAllNotificationsRead => {
                let result = port.mark_all_notifications_read(token).await;
                Action::NotificationsMarkedRead { id: None, result }
            }
            BackendCommand::LoadCredits => Action::CreditsLoaded(port.fetch_credits(token).await),
            BackendCommand::LoadAdminStats => {
                Action::AdminStatsLoaded(port.fetch_admin_stats(token).await)
            }
            BackendCommand::LoadAdminUsers { generation, page } => {
                let result = port.fetch_admin_users(token, None, page).await;
                Action::AdminUsersLoaded { generation, result }
            }
            BackendCommand::SetUserStatus { user_id, status } => {
                let result = port.set_user_status(token, user_id, status).await;
                match &result {
                    Ok(_) => info!(user_id = %user_id, status = %status, "User status changed"),
                    Err(e) => warn!(user_id = %user_id, error = %e, "Failed to change user status"),
                }
                Action::UserStatusChanged { user_id, result }
            }
            BackendCommand::LoadModerationQueue { generation, page } => {
                let result = port.fetch_moderation_queue(token, page).await;
                Action::ModerationQueueLoaded { generation, result }
            }
            BackendCommand::ModerateListing {
                listing_id,
                decision,
            } => {
                let result = port.moderate_listing(token, listing_id, &decision).await;
                match &result {
                    Ok(()) => info!(listing_id = %listing_id, decision = decision.label(), "Listing moderated"),
                    Err(e) => warn!(listing_id = %listing_id, error = %e, "Failed to moderate listing"),
                }
                Action::ListingModerated {
                    listing_id,
                    decision,
                    result,
                }
            }
        };

        Some(action)
    }

    async fn load_initial_data(
        &self,
        filter: &ListingFilter,
        listings: (Generation, PageRequest),
        notifications: (Generation, PageRequest),
        include_admin: bool,
    ) -> InitialData {
        let port = &self.marketplace;
        let token = &self.token;

        let admin_future = async {
            if include_admin {
                Some(port.fetch_admin_stats(token).await)
            } else {
                None
            }
        };

        let (categories, listings_page, conversations, credits, notifications_page, admin_stats) = tokio::join!(
            port.fetch_categories(token),
            port.fetch_listings(token, filter, listings.1),
            port.fetch_conversations(token),
            port.fetch_credits(token),
            port.fetch_notifications(token, notifications.1),
            admin_future,
        );

        let mut data = InitialData::default();
        data.categories = data.collect("categories", categories).unwrap_or_default();
        data.listings = data
            .collect("listings", listings_page)
            .map(|page| (listings.0, page));
        if let Some((_, page)) = &data.listings {
            self.favorites.sync_from(&page.items);
        }
        data.conversations = data
            .collect("conversations", conversations)
            .unwrap_or_default();
        data.credits = data.collect("credits", credits);
        data.notifications = data
            .collect("notifications", notifications_page)
            .map(|page| (notifications.0, page));
        data.admin_stats = admin_stats.and_then(|result| data.collect("dashboard", result));

        info!(
            categories = data.categories.len(),
            conversations = data.conversations.len(),
            failures = data.errors.len(),
            "Initial data loaded"
        );
        data
    }
}
