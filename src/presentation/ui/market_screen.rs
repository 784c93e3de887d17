//! Tabbed marketplace screen shown after login.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    widgets::{StatefulWidget, Widget},
};
use tracing::{debug, info};

use super::backend::{Action as BackendAction, BackendCommand, InitialData};
use super::views::{
    AdminView, BlogView, BrowseView, CreditsView, FavoritesView, InboxView, MarketContext,
    MarketRequest, MessagesView, ViewSettings,
};
use crate::application::services::{CommitOutcome, FavoritesService, SearchService};
use crate::domain::ConnectionStatus;
use crate::domain::entities::User;
use crate::domain::keybinding::{Action, KeyContext, Keybind};
use crate::domain::realtime::RealtimeEvent;
use crate::infrastructure::config::Preferences;
use crate::presentation::commands::{CommandRegistry, HasCommands};
use crate::presentation::theme::Theme;
use crate::presentation::widgets::{FooterBar, FooterBarStyle, HeaderBar, HeaderBarStyle};
use crate::{NAME, VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketTab {
    Browse,
    Favorites,
    Messages,
    Blog,
    Inbox,
    Credits,
    Admin,
}

impl MarketTab {
    const ALL: [Self; 7] = [
        Self::Browse,
        Self::Favorites,
        Self::Messages,
        Self::Blog,
        Self::Inbox,
        Self::Credits,
        Self::Admin,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Browse => "Browse",
            Self::Favorites => "Favorites",
            Self::Messages => "Messages",
            Self::Blog => "Blog",
            Self::Inbox => "Inbox",
            Self::Credits => "Credits",
            Self::Admin => "Admin",
        }
    }

    /// Key stored as the `last_tab` preference.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Favorites => "favorites",
            Self::Messages => "messages",
            Self::Blog => "blog",
            Self::Inbox => "inbox",
            Self::Credits => "credits",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.name() == name)
    }

    #[must_use]
    pub const fn key_context(self) -> KeyContext {
        match self {
            Self::Browse => KeyContext::Browse,
            Self::Favorites => KeyContext::Favorites,
            Self::Messages => KeyContext::Messages,
            Self::Blog => KeyContext::Blog,
            Self::Inbox => KeyContext::Inbox,
            Self::Credits => KeyContext::Credits,
            Self::Admin => KeyContext::Admin,
        }
    }
}

/// Everything the market screen needs at construction.
pub struct MarketSetup {
    pub user: User,
    pub theme: Theme,
    pub registry: Arc<CommandRegistry>,
    pub settings: ViewSettings,
    pub favorites: FavoritesService,
    pub search: SearchService,
    pub notification_sound: bool,
}

pub struct MarketScreenState {
    ctx: MarketContext,
    tabs: Vec<MarketTab>,
    active: usize,
    browse: BrowseView,
    favorites: FavoritesView,
    messages: MessagesView,
    blog: BlogView,
    inbox: InboxView,
    credits: CreditsView,
    admin: AdminView,
}

impl MarketScreenState {
    #[must_use]
    pub fn new(setup: MarketSetup, preferences: &Preferences) -> Self {
        let MarketSetup {
            user,
            theme,
            registry,
            settings,
            favorites,
            search,
            notification_sound,
        } = setup;

        let tabs: Vec<MarketTab> = MarketTab::ALL
            .into_iter()
            .filter(|tab| *tab != MarketTab::Admin || user.role().can_moderate())
            .collect();
        let active = preferences
            .last_tab
            .as_deref()
            .and_then(MarketTab::from_name)
            .and_then(|tab| tabs.iter().position(|t| *t == tab))
            .unwrap_or(0);

        let ctx = MarketContext {
            credits: Some(user.credits()),
            user,
            theme,
            registry,
            favorites,
            search,
            categories: Vec::new(),
            location: preferences.location.clone(),
            connection: ConnectionStatus::Disconnected,
            notification_sound,
            settings,
        };

        Self {
            browse: BrowseView::new(&ctx.settings, &ctx.theme),
            favorites: FavoritesView::new(&ctx.settings),
            messages: MessagesView::new(&ctx.theme),
            blog: BlogView::new(&ctx.settings),
            inbox: InboxView::new(&ctx.settings),
            credits: CreditsView::new(),
            admin: AdminView::new(&ctx.settings),
            ctx,
            tabs,
            active,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &MarketContext {
        &self.ctx
    }

    #[must_use]
    pub fn tabs(&self) -> &[MarketTab] {
        &self.tabs
    }

    #[must_use]
    pub fn active_tab(&self) -> MarketTab {
        self.tabs.get(self.active).copied().unwrap_or(MarketTab::Browse)
    }

    #[must_use]
    pub const fn connection_status(&self) -> ConnectionStatus {
        self.ctx.connection
    }

    pub const fn set_connection_status(&mut self, status: ConnectionStatus) {
        self.ctx.connection = status;
    }

    /// The batched first load, plus whatever the restored tab needs.
    pub fn initial_requests(&mut self) -> Vec<MarketRequest> {
        self.credits.begin_initial();
        let command = BackendCommand::LoadInitialData {
            filter: self.browse.effective_filter(&self.ctx),
            listings: self.browse.begin_initial(),
            notifications: self.inbox.begin_initial(),
            include_admin: self.ctx.user.role().can_moderate(),
        };
        let mut requests = vec![MarketRequest::Command(command)];
        requests.extend(self.activate());
        requests
    }

    /// Writes the session's preferences back for saving.
    pub fn fill_preferences(&self, preferences: &mut Preferences) {
        preferences.location.clone_from(&self.ctx.location);
        preferences.recent_searches = self.ctx.search.recent().clone();
        preferences.notification_sound = Some(self.ctx.notification_sound);
        preferences.last_tab = Some(self.active_tab().name().to_string());
    }

    fn select_tab(&mut self, index: usize) -> Vec<MarketRequest> {
        if index >= self.tabs.len() || index == self.active {
            return Vec::new();
        }
        self.active = index;
        debug!(tab = self.active_tab().name(), "Switched tab");
        self.activate()
    }

    fn select(&mut self, tab: MarketTab) -> Vec<MarketRequest> {
        self.tabs
            .iter()
            .position(|t| *t == tab)
            .map(|index| self.select_tab(index))
            .unwrap_or_default()
    }

    fn activate(&mut self) -> Vec<MarketRequest> {
        match self.active_tab() {
            MarketTab::Favorites => self.favorites.on_activate(),
            MarketTab::Blog => self.blog.on_activate(),
            MarketTab::Credits => self.credits.on_activate(),
            MarketTab::Admin => self.admin.on_activate(),
            MarketTab::Browse | MarketTab::Messages | MarketTab::Inbox => Vec::new(),
        }
    }

    /// Whether a text input has the keyboard.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        match self.active_tab() {
            MarketTab::Browse => self.browse.is_editing(),
            MarketTab::Messages => self.messages.is_composing(),
            _ => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<MarketRequest> {
        match self.active_tab() {
            MarketTab::Browse if self.browse.is_editing() => {
                return self.browse.handle_input_key(key, &mut self.ctx);
            }
            MarketTab::Messages if self.messages.is_composing() => {
                return self.messages.handle_input_key(key);
            }
            _ => {}
        }

        if let KeyCode::Char(c @ '1'..='9') = key.code
            && key.modifiers == KeyModifiers::NONE
        {
            let index = usize::from(c as u8 - b'1');
            return self.select_tab(index);
        }

        let context = self.active_tab().key_context();
        let Some(action) = self.ctx.registry.find_action(context, key) else {
            return Vec::new();
        };
        self.handle_action(action)
    }

    fn handle_action(&mut self, action: Action) -> Vec<MarketRequest> {
        match action {
            Action::Quit => vec![MarketRequest::Quit],
            Action::Logout => vec![MarketRequest::Logout],
            Action::NextTab => self.select_tab((self.active + 1) % self.tabs.len().max(1)),
            Action::PreviousTab => {
                let len = self.tabs.len().max(1);
                self.select_tab((self.active + len - 1) % len)
            }
            Action::ToggleSound => {
                self.ctx.notification_sound = !self.ctx.notification_sound;
                let state = if self.ctx.notification_sound { "on" } else { "off" };
                vec![
                    MarketRequest::PreferencesChanged,
                    MarketRequest::info("Sound", format!("Notification sound {state}")),
                ]
            }
            action => match self.active_tab() {
                MarketTab::Browse => self.browse.handle_action(action, &mut self.ctx),
                MarketTab::Favorites => self.favorites.handle_action(action, &mut self.ctx),
                MarketTab::Messages => self.messages.handle_action(action, &mut self.ctx),
                MarketTab::Blog => self.blog.handle_action(action),
                MarketTab::Inbox => self.inbox.handle_action(action),
                MarketTab::Credits => self.credits.handle_action(action),
                MarketTab::Admin => self.admin.handle_action(action, &self.ctx),
            },
        }
    }

    /// Routes a backend result to the views. Failures become error toasts.
    pub fn apply(&mut self, action: BackendAction) -> Vec<MarketRequest> {
        let me = self.ctx.user.id();
        match action {
            BackendAction::LoginFinished(_) => Vec::new(),
            BackendAction::InitialDataLoaded(data) => self.apply_initial(*data),
            BackendAction::ListingsLoaded { generation, result } => {
                let toast = failure("Listings", result.as_ref().err());
                self.browse.on_listings_loaded(generation, result, &self.ctx);
                toast
            }
            BackendAction::ListingLoaded(result) => match result {
                Ok(listing) => {
                    self.browse.on_listing_loaded(listing.clone(), &self.ctx);
                    self.favorites.on_listing_updated(listing, &self.ctx);
                    Vec::new()
                }
                Err(e) => failure("Listing", Some(&e)),
            },
            BackendAction::FavoritesLoaded { generation, result } => {
                let toast = failure("Favorites", result.as_ref().err());
                self.favorites.on_favorites_loaded(generation, result, &self.ctx);
                toast
            }
            BackendAction::FavoriteCommitted { intent, outcome } => {
                self.browse.refresh_favorite(intent.listing_id, &self.ctx);
                self.favorites.on_favorite_committed(&intent, &outcome, &self.ctx);
                match &outcome {
                    CommitOutcome::RolledBack(e) => vec![MarketRequest::error(
                        "Favorite",
                        format!("Change reverted: {}", e.user_message()),
                    )],
                    CommitOutcome::Confirmed | CommitOutcome::Stale => Vec::new(),
                }
            }
            BackendAction::ConversationsLoaded(result) => match result {
                Ok(conversations) => {
                    self.messages.set_conversations(conversations);
                    Vec::new()
                }
                Err(e) => failure("Messages", Some(&e)),
            },
            BackendAction::MessagesLoaded {
                conversation_id,
                result,
            } => match result {
                Ok(page) => {
                    self.messages.on_messages_loaded(conversation_id, page);
                    Vec::new()
                }
                Err(e) => failure("Messages", Some(&e)),
            },
            BackendAction::MessageSent {
                conversation_id,
                nonce,
                result,
            } => {
                let toast = failure("Message not sent", result.as_ref().err());
                self.messages
                    .on_message_sent(conversation_id, &nonce, result, me);
                toast
            }
            BackendAction::ConversationStarted { listing_id, result } => match result {
                Ok(conversation) => {
                    info!(listing_id = %listing_id, conversation_id = %conversation.id(), "Conversation started");
                    let mut requests = self.select(MarketTab::Messages);
                    requests.extend(self.messages.on_conversation_started(conversation, &self.ctx));
                    requests
                }
                Err(e) => failure("Contact seller", Some(&e)),
            },
            BackendAction::BlogPostsLoaded { generation, result } => {
                let toast = failure("Blog", result.as_ref().err());
                self.blog.on_posts_loaded(generation, result);
                toast
            }
            BackendAction::BlogPostLoaded(result) => match result {
                Ok(post) => {
                    self.blog.on_post_loaded(post);
                    Vec::new()
                }
                Err(e) => failure("Blog", Some(&e)),
            },
            BackendAction::NotificationsLoaded { generation, result } => {
                let toast = failure("Inbox", result.as_ref().err());
                self.inbox.on_notifications_loaded(generation, result);
                toast
            }
            BackendAction::NotificationsMarkedRead { id, result } => {
                let mut requests = failure("Inbox", result.as_ref().err());
                requests.extend(self.inbox.on_marked_read(id, &result));
                requests
            }
            BackendAction::CreditsLoaded(result) => match result {
                Ok(account) => {
                    self.credits.set_account(account, &mut self.ctx);
                    Vec::new()
                }
                Err(e) => {
                    self.credits.on_load_failed();
                    failure("Credits", Some(&e))
                }
            },
            BackendAction::AdminStatsLoaded(result) => match result {
                Ok(stats) => {
                    self.admin.set_stats(stats);
                    Vec::new()
                }
                Err(e) => failure("Dashboard", Some(&e)),
            },
            BackendAction::AdminUsersLoaded { generation, result } => {
                let toast = failure("Users", result.as_ref().err());
                self.admin.on_users_loaded(generation, result);
                toast
            }
            BackendAction::UserStatusChanged { user_id, result } => match result {
                Ok(user) => self.admin.on_user_status_changed(user_id, user),
                Err(e) => failure("Users", Some(&e)),
            },
            BackendAction::ModerationQueueLoaded { generation, result } => {
                let toast = failure("Moderation", result.as_ref().err());
                self.admin.on_queue_loaded(generation, result);
                toast
            }
            BackendAction::ListingModerated {
                listing_id,
                decision,
                result,
            } => match result {
                Ok(()) => self.admin.on_listing_moderated(listing_id, &decision),
                Err(e) => failure("Moderation", Some(&e)),
            },
        }
    }

    fn apply_initial(&mut self, data: InitialData) -> Vec<MarketRequest> {
        let InitialData {
            categories,
            listings,
            conversations,
            credits,
            notifications,
            admin_stats,
            errors,
        } = data;

        self.ctx.categories = categories;
        match listings {
            Some((generation, page)) => self.browse.set_initial_page(generation, page, &self.ctx),
            None => self.browse.fail_initial(),
        }
        self.messages.set_conversations(conversations);
        match credits {
            Some(account) => self.credits.set_account(account, &mut self.ctx),
            None => self.credits.on_load_failed(),
        }
        match notifications {
            Some((generation, page)) => self.inbox.on_notifications_loaded(generation, Ok(page)),
            None => self.inbox.fail_initial(),
        }
        if let Some(stats) = admin_stats {
            self.admin.set_stats(stats);
        }

        errors
            .into_iter()
            .map(|(what, e)| MarketRequest::error(format!("Could not load {what}"), e.user_message()))
            .collect()
    }

    /// Applies a pushed event and returns follow-up requests.
    pub fn on_realtime(&mut self, event: RealtimeEvent) -> Vec<MarketRequest> {
        self.ctx.connection = self.ctx.connection.after(&event);
        match event {
            RealtimeEvent::MessageCreated(message) => {
                self.messages.on_message_created(message, &self.ctx)
            }
            RealtimeEvent::ConversationRead(id) => {
                self.messages.on_conversation_read(id);
                Vec::new()
            }
            RealtimeEvent::NotificationCreated(notification) => {
                self.inbox.on_notification_created(notification)
            }
            RealtimeEvent::ListingUpdated(listing) => {
                self.browse.on_listing_loaded(listing.clone(), &self.ctx);
                self.favorites.on_listing_updated(listing.clone(), &self.ctx);
                self.admin.on_listing_updated(listing);
                Vec::new()
            }
            RealtimeEvent::CreditsUpdated { balance } => {
                self.credits.on_balance_updated(balance, &mut self.ctx)
            }
            RealtimeEvent::Disconnected {
                reason,
                will_retry: false,
            } => vec![MarketRequest::warn("Live updates stopped", reason)],
            RealtimeEvent::Error {
                message,
                recoverable: false,
            } => vec![MarketRequest::error("Live updates", message)],
            RealtimeEvent::Connected
            | RealtimeEvent::Disconnected { .. }
            | RealtimeEvent::Reconnecting { .. }
            | RealtimeEvent::Error { .. } => Vec::new(),
        }
    }

    fn tab_labels(&self) -> Vec<String> {
        self.tabs
            .iter()
            .map(|tab| {
                let badge = match tab {
                    MarketTab::Messages => {
                        usize::try_from(self.messages.unread_total()).unwrap_or(usize::MAX)
                    }
                    MarketTab::Inbox => self.inbox.unread_count(),
                    _ => 0,
                };
                if badge > 0 {
                    format!("{} ({badge})", tab.label())
                } else {
                    tab.label().to_string()
                }
            })
            .collect()
    }

    fn keybinds(&self) -> Vec<Keybind> {
        let registry = self.ctx.registry.as_ref();
        let mut binds = match self.active_tab() {
            MarketTab::Browse => self.browse.get_commands(registry),
            MarketTab::Favorites => self.favorites.get_commands(registry),
            MarketTab::Messages => self.messages.get_commands(registry),
            MarketTab::Blog => self.blog.get_commands(registry),
            MarketTab::Inbox => self.inbox.get_commands(registry),
            MarketTab::Credits => self.credits.get_commands(registry),
            MarketTab::Admin => self.admin.get_commands(registry),
        };
        if !self.is_editing() {
            binds.extend(
                [(Action::NextTab, "Tab"), (Action::Quit, "Quit")]
                    .into_iter()
                    .filter_map(|(action, label)| registry.keybind(action, label)),
            );
        }
        binds
    }
}

fn failure(title: &str, error: Option<&crate::domain::ApiError>) -> Vec<MarketRequest> {
    error
        .map(|e| MarketRequest::error(title, e.user_message()))
        .into_iter()
        .collect()
}

pub struct MarketScreen;

impl MarketScreen {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for MarketScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl StatefulWidget for MarketScreen {
    type State = MarketScreenState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [header_area, content_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area);

        render_header_bar(state, header_area, buf);
        render_content_area(state, content_area, buf);
        render_footer_bar(state, footer_area, buf);
    }
}

fn render_header_bar(state: &MarketScreenState, area: Rect, buf: &mut Buffer) {
    let labels = state.tab_labels();
    let tabs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let header = HeaderBar::new(NAME, VERSION)
        .tabs(&tabs, state.active)
        .credits(state.ctx.credits)
        .connection_status(state.ctx.connection)
        .style(HeaderBarStyle::from_theme(&state.ctx.theme));
    Widget::render(header, area, buf);
}

fn render_footer_bar(state: &MarketScreenState, area: Rect, buf: &mut Buffer) {
    let keybinds = state.keybinds();
    let sound = if state.ctx.notification_sound {
        "♪ on"
    } else {
        "♪ off"
    };
    let info = format!("{} · {sound}", state.ctx.user.display_name());
    let footer = FooterBar::new(&keybinds)
        .context_label(state.active_tab().label())
        .right_info(Some(info.as_str()))
        .style(FooterBarStyle::from_theme(&state.ctx.theme));
    Widget::render(footer, area, buf);
}

fn render_content_area(state: &mut MarketScreenState, area: Rect, buf: &mut Buffer) {
    let ctx = &state.ctx;
    match state.tabs.get(state.active).copied().unwrap_or(MarketTab::Browse) {
        MarketTab::Browse => state.browse.render(ctx, area, buf),
        MarketTab::Favorites => state.favorites.render(ctx, area, buf),
        MarketTab::Messages => state.messages.render(ctx, area, buf),
        MarketTab::Blog => state.blog.render(ctx, area, buf),
        MarketTab::Inbox => state.inbox.render(ctx, area, buf),
        MarketTab::Credits => state.credits.render(ctx, area, buf),
        MarketTab::Admin => state.admin.render(ctx, area, buf),
    }
}

#[cfg(test)]
mod tests {
    use super::super::views::test_support::{commands, toasts};
    use super::*;
    use crate::domain::ApiError;
    use crate::domain::entities::{Conversation, ConversationId, ListingId, Participant, UserId, UserRole};
    use crate::domain::notification::ToastLevel;
    use crate::domain::ports::mocks::MockMarketplace;
    use crate::domain::search::RecentSearches;
    use chrono::Utc;
    use ratatui::{Terminal, backend::TestBackend};

    fn state_for(user: User, preferences: &Preferences) -> MarketScreenState {
        MarketScreenState::new(
            MarketSetup {
                user,
                theme: Theme::default(),
                registry: Arc::new(CommandRegistry::new()),
                settings: ViewSettings::default(),
                favorites: FavoritesService::new(Arc::new(MockMarketplace::new())),
                search: SearchService::new(RecentSearches::new()),
                notification_sound: true,
            },
            preferences,
        )
    }

    fn buyer() -> User {
        User::new(3_u64, "Buyer", "buyer@example.com")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_admin_tab_only_for_moderators() {
        let state = state_for(buyer(), &Preferences::default());
        assert!(!state.tabs().contains(&MarketTab::Admin));

        let admin = User::new(1_u64, "Root", "root@example.com").with_role(UserRole::Admin);
        let state = state_for(admin, &Preferences::default());
        assert_eq!(state.tabs().len(), 7);
    }

    #[test]
    fn test_initial_requests_batch_and_restore_tab() {
        let preferences = Preferences {
            last_tab: Some("favorites".to_string()),
            ..Preferences::default()
        };
        let mut state = state_for(buyer(), &preferences);
        assert_eq!(state.active_tab(), MarketTab::Favorites);

        let requests = state.initial_requests();
        let commands = commands(&requests);
        assert!(matches!(
            commands[0],
            BackendCommand::LoadInitialData { include_admin: false, .. }
        ));
        assert!(matches!(commands[1], BackendCommand::LoadFavorites { .. }));
    }

    #[test]
    fn test_digit_and_tab_keys_switch_tabs() {
        let mut state = state_for(buyer(), &Preferences::default());

        let requests = state.handle_key(key(KeyCode::Char('4')));
        assert_eq!(state.active_tab(), MarketTab::Blog);
        assert!(matches!(commands(&requests)[..], [BackendCommand::LoadBlogPosts { .. }]));

        state.handle_key(key(KeyCode::Tab));
        assert_eq!(state.active_tab(), MarketTab::Inbox);
        state.handle_key(key(KeyCode::BackTab));
        assert_eq!(state.active_tab(), MarketTab::Blog);

        assert!(state.handle_key(key(KeyCode::Char('9'))).is_empty());
        assert_eq!(state.active_tab(), MarketTab::Blog);
    }

    #[test]
    fn test_quit_and_logout() {
        let mut state = state_for(buyer(), &Preferences::default());
        assert!(matches!(
            state.handle_key(key(KeyCode::Char('q')))[..],
            [MarketRequest::Quit]
        ));
        assert!(matches!(
            state.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL))[..],
            [MarketRequest::Logout]
        ));
    }

    #[test]
    fn test_search_input_swallows_quit_key() {
        let mut state = state_for(buyer(), &Preferences::default());
        state.handle_key(key(KeyCode::Char('/')));
        assert!(state.is_editing());

        let requests = state.handle_key(key(KeyCode::Char('q')));
        assert!(!requests.iter().any(|r| matches!(r, MarketRequest::Quit)));
    }

    #[test]
    fn test_initial_errors_become_toasts() {
        let mut state = state_for(buyer(), &Preferences::default());
        state.initial_requests();

        let data = InitialData {
            categories: Vec::new(),
            listings: None,
            conversations: Vec::new(),
            credits: None,
            notifications: None,
            admin_stats: None,
            errors: vec![("listings", ApiError::network("offline"))],
        };
        let requests = state.apply(BackendAction::InitialDataLoaded(Box::new(data)));
        let toasts = toasts(&requests);
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].0, ToastLevel::Error);
    }

    #[test]
    fn test_started_conversation_opens_messages() {
        let mut state = state_for(buyer(), &Preferences::default());
        let conversation = Conversation::new(
            5_u64,
            Participant {
                id: UserId(8),
                name: "Seller".to_string(),
            },
            Utc::now(),
        );

        let requests = state.apply(BackendAction::ConversationStarted {
            listing_id: ListingId(1),
            result: Ok(conversation),
        });

        assert_eq!(state.active_tab(), MarketTab::Messages);
        assert!(state.is_editing());
        assert!(commands(&requests).iter().any(|c| matches!(
            c,
            BackendCommand::LoadMessages { conversation_id: ConversationId(5), .. }
        )));
    }

    #[test]
    fn test_toggle_sound_is_saved() {
        let mut state = state_for(buyer(), &Preferences::default());
        let requests = state.handle_key(key(KeyCode::Char('S')));
        assert!(matches!(requests.first(), Some(MarketRequest::PreferencesChanged)));

        let mut preferences = Preferences::default();
        state.fill_preferences(&mut preferences);
        assert_eq!(preferences.notification_sound, Some(false));
        assert_eq!(preferences.last_tab.as_deref(), Some("browse"));
    }

    #[test]
    fn test_realtime_updates_connection_status() {
        let mut state = state_for(buyer(), &Preferences::default());
        state.on_realtime(RealtimeEvent::Connected);
        assert_eq!(state.connection_status(), ConnectionStatus::Connected);

        let requests = state.on_realtime(RealtimeEvent::Error {
            message: "gone".to_string(),
            recoverable: false,
        });
        assert_eq!(state.connection_status(), ConnectionStatus::Error);
        assert_eq!(toasts(&requests).len(), 1);
    }

    #[test]
    fn test_renders_header_and_footer() {
        let mut state = state_for(buyer(), &Preferences::default());
        let backend = TestBackend::new(100, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                frame.render_stateful_widget(MarketScreen::new(), frame.area(), &mut state);
            })
            .unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(content.contains("Browse"));
        assert!(content.contains("Buyer"));
    }
}
