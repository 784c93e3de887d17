//! Main application orchestrator.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent};
use futures_util::StreamExt;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use super::backend::{Action, Backend, BackendCommand};
use super::login_screen::{LoginAction, LoginScreen};
use super::market_screen::{MarketScreen, MarketScreenState, MarketSetup};
use super::splash_screen::SplashScreen;
use super::views::{MarketRequest, ViewSettings};
use crate::application::dto::{LoginRequest, LoginResponse, TokenSource};
use crate::application::services::{FavoritesService, NotificationManager, SearchService};
use crate::application::use_cases::{LoginUseCase, ResolveTokenUseCase};
use crate::domain::ConnectionStatus;
use crate::domain::entities::AuthToken;
use crate::domain::errors::ApiError;
use crate::domain::ports::{AuthPort, MarketplaceDataPort, NotificationPort, TokenStoragePort};
use crate::domain::realtime::RealtimeEvent;
use crate::infrastructure::browser;
use crate::infrastructure::config::{AppConfig, Preferences, StorageManager};
use crate::infrastructure::realtime::{RealtimeClient, RealtimeClientConfig};
use crate::presentation::commands::CommandRegistry;
use crate::presentation::events;
use crate::presentation::theme::Theme;
use crate::presentation::widgets::NotificationPopup;

const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppState {
    Login,
    Loading,
    Market,
    Exiting,
}

enum CurrentScreen {
    Login(LoginScreen),
    /// The market state is built right after login and fills in while the splash shows.
    Loading(SplashScreen, Box<MarketScreenState>),
    Market(Box<MarketScreenState>),
}

/// Adapters the app talks to.
pub struct AppPorts {
    pub auth: Arc<dyn AuthPort>,
    pub marketplace: Arc<dyn MarketplaceDataPort>,
    pub token_storage: Arc<dyn TokenStoragePort>,
    pub notifier: Arc<dyn NotificationPort>,
}

pub struct App {
    state: AppState,
    screen: CurrentScreen,
    config: AppConfig,
    storage: StorageManager,
    preferences: Preferences,
    sound_override: Option<bool>,
    theme: Theme,
    registry: Arc<CommandRegistry>,
    login_use_case: LoginUseCase,
    resolve_token_use_case: ResolveTokenUseCase,
    marketplace: Arc<dyn MarketplaceDataPort>,
    notifier: Arc<dyn NotificationPort>,
    notifications: NotificationManager,
    current_token: Option<AuthToken>,
    command_tx: Option<mpsc::UnboundedSender<BackendCommand>>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    realtime_client: Option<RealtimeClient>,
    realtime_rx: Option<mpsc::UnboundedReceiver<RealtimeEvent>>,
}

impl App {
    #[must_use]
    pub fn new(
        config: AppConfig,
        storage: StorageManager,
        preferences: Preferences,
        ports: AppPorts,
    ) -> Self {
        let AppPorts {
            auth,
            marketplace,
            token_storage,
            notifier,
        } = ports;
        let login_use_case = LoginUseCase::new(auth, token_storage.clone());
        let resolve_token_use_case = ResolveTokenUseCase::new(token_storage);
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let theme = Theme::new(&config.theme.accent_color, config.theme.mode);
        let registry = Arc::new(CommandRegistry::with_overrides(&config.keybindings));
        let notifications = NotificationManager::new(config.ui.notification_duration())
            .with_enabled(config.notifications.internal);
        notifier.set_sound_enabled(
            preferences
                .notification_sound
                .unwrap_or(config.notifications.sound),
        );

        Self {
            state: AppState::Login,
            screen: CurrentScreen::Login(LoginScreen::new()),
            config,
            storage,
            preferences,
            sound_override: None,
            theme,
            registry,
            login_use_case,
            resolve_token_use_case,
            marketplace,
            notifier,
            notifications,
            current_token: None,
            command_tx: None,
            action_tx,
            action_rx,
            realtime_client: None,
            realtime_rx: None,
        }
    }

    /// Sound setting for this run only; the stored preference is left untouched.
    #[must_use]
    pub fn with_sound_override(mut self, sound: Option<bool>) -> Self {
        if let Some(sound) = sound {
            self.notifier.set_sound_enabled(sound);
        }
        self.sound_override = sound;
        self
    }

    /// # Errors
    /// Returns error if drawing to the terminal fails.
    pub async fn run(
        mut self,
        terminal: &mut DefaultTerminal,
        cli_token: Option<String>,
    ) -> color_eyre::Result<()> {
        if let Some(resolved) = self.resolve_token_use_case.execute(cli_token).await {
            info!(source = %resolved.source, "Found existing token");
            let persist = resolved.source != TokenSource::Keyring;
            let request = LoginRequest::token(resolved.token.as_str().to_string(), resolved.source)
                .with_persistence(persist);
            self.begin_login(request);
        }

        self.run_event_loop(terminal).await?;

        self.save_preferences();
        self.disconnect_realtime();
        info!("Application exiting normally");
        Ok(())
    }

    async fn run_event_loop(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        let mut terminal_events = EventStream::new();
        let mut tick_interval = interval(TICK_RATE);

        terminal.draw(|frame| self.render(frame))?;

        while self.state != AppState::Exiting {
            let realtime_future = match &mut self.realtime_rx {
                Some(rx) => futures_util::future::Either::Left(rx.recv()),
                None => futures_util::future::Either::Right(std::future::pending()),
            };
            let terminal_event = terminal_events.next();

            tokio::select! {
                biased;

                event = realtime_future => {
                    match event {
                        Some(event) => self.handle_realtime_event(event),
                        None => {
                            debug!("Realtime channel closed");
                            self.realtime_rx = None;
                        }
                    }
                    terminal.draw(|frame| self.render(frame))?;
                }

                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                    terminal.draw(|frame| self.render(frame))?;
                }

                _ = tick_interval.tick() => {
                    self.notifications.tick();
                    if let CurrentScreen::Loading(splash, _) = &mut self.screen {
                        splash.tick(TICK_RATE);
                    }
                    terminal.draw(|frame| self.render(frame))?;
                }

                Some(Ok(event)) = terminal_event => {
                    if let Event::Key(key) = event {
                        self.handle_key(key);
                    }
                    terminal.draw(|frame| self.render(frame))?;
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        match &mut self.screen {
            CurrentScreen::Login(screen) => {
                frame.render_widget(&*screen, frame.area());
            }
            CurrentScreen::Loading(splash, _) => {
                frame.render_widget(&*splash, frame.area());
            }
            CurrentScreen::Market(state) => {
                frame.render_stateful_widget(MarketScreen::new(), frame.area(), state);
            }
        }

        if let Some(toast) = self.notifications.current_notification() {
            frame.render_widget(NotificationPopup::new(toast, &self.theme), frame.area());
        }
    }

    fn market(&self) -> Option<&MarketScreenState> {
        match &self.screen {
            CurrentScreen::Loading(_, state) | CurrentScreen::Market(state) => Some(state),
            CurrentScreen::Login(_) => None,
        }
    }

    fn market_mut(&mut self) -> Option<&mut MarketScreenState> {
        match &mut self.screen {
            CurrentScreen::Loading(_, state) | CurrentScreen::Market(state) => Some(state),
            CurrentScreen::Login(_) => None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if !events::is_press(&key) {
            return;
        }
        if events::is_force_quit(&key) {
            info!("Quit requested");
            self.state = AppState::Exiting;
            return;
        }

        let requests = match &mut self.screen {
            CurrentScreen::Login(screen) => {
                match screen.handle_key(key) {
                    LoginAction::Submit => {
                        if let Some(request) = screen.request() {
                            self.begin_login(request);
                        }
                    }
                    LoginAction::DeleteToken => self.delete_stored_token(),
                    LoginAction::Quit => self.state = AppState::Exiting,
                    LoginAction::None => {}
                }
                return;
            }
            CurrentScreen::Loading(..) => return,
            CurrentScreen::Market(state) => state.handle_key(key),
        };
        self.process_requests(requests);
    }

    fn begin_login(&mut self, request: LoginRequest) {
        if let CurrentScreen::Login(screen) = &mut self.screen {
            screen.set_validating();
        }

        let use_case = self.login_use_case.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = use_case.execute(request).await;
            let _ = tx.send(Action::LoginFinished(result));
        });
    }

    fn handle_action(&mut self, action: Action) {
        if let Action::LoginFinished(result) = action {
            self.on_login_finished(result);
            return;
        }

        if action.is_auth_failure() {
            let message = action
                .error()
                .map_or_else(|| "Please sign in again".to_string(), ApiError::user_message);
            warn!(error = %message, "Session rejected by the marketplace");
            self.expire_session(message);
            return;
        }

        let finishes_loading = matches!(action, Action::InitialDataLoaded(_));
        let Some(market) = self.market_mut() else {
            debug!("Dropping backend action without an active session");
            return;
        };
        let requests = market.apply(action);
        if finishes_loading {
            self.finish_loading();
        }
        self.process_requests(requests);
    }

    fn on_login_finished(&mut self, result: Result<LoginResponse, ApiError>) {
        if self.state != AppState::Login {
            debug!("Ignoring login result outside the login screen");
            return;
        }
        match result {
            Ok(response) => {
                info!(
                    user = %response.user.display_name(),
                    source = %response.token_source,
                    persisted = response.token_persisted,
                    "Login successful"
                );
                if let CurrentScreen::Login(screen) = &mut self.screen {
                    screen.set_success();
                }
                self.start_session(response);
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                if let CurrentScreen::Login(screen) = &mut self.screen {
                    screen.set_error(e.user_message());
                }
            }
        }
    }

    fn start_session(&mut self, response: LoginResponse) {
        let LoginResponse { user, token, .. } = response;

        // A fresh channel per session keeps late results of an old session out.
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        self.action_tx = action_tx;
        self.action_rx = action_rx;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let favorites = FavoritesService::new(self.marketplace.clone());
        let backend = Backend::new(
            self.marketplace.clone(),
            favorites.clone(),
            token.clone(),
            command_rx,
            self.action_tx.clone(),
        );
        tokio::spawn(backend.run());
        self.command_tx = Some(command_tx);

        let mut recent = self.preferences.recent_searches.clone();
        recent.set_capacity(self.config.search.recent_limit);
        let user_label = user.display_name();
        let setup = MarketSetup {
            user,
            theme: self.theme,
            registry: self.registry.clone(),
            settings: ViewSettings {
                date_format: self.config.ui.date_format.clone(),
                show_images_count: self.config.ui.show_images_count,
                page_size: self.config.api.page_size(),
            },
            favorites,
            search: SearchService::new(recent),
            notification_sound: self
                .sound_override
                .or(self.preferences.notification_sound)
                .unwrap_or(self.config.notifications.sound),
        };
        let mut market = Box::new(MarketScreenState::new(setup, &self.preferences));
        let requests = market.initial_requests();

        self.state = AppState::Loading;
        self.screen = CurrentScreen::Loading(SplashScreen::new(self.theme, user_label), market);
        self.process_requests(requests);

        if self.config.api.realtime {
            self.connect_realtime(&token);
        }
        self.current_token = Some(token);
    }

    fn finish_loading(&mut self) {
        let screen = std::mem::replace(&mut self.screen, CurrentScreen::Login(LoginScreen::new()));
        self.screen = match screen {
            CurrentScreen::Loading(_, market) => {
                info!("Initial data loaded");
                self.state = AppState::Market;
                CurrentScreen::Market(market)
            }
            other => other,
        };
    }

    fn connect_realtime(&mut self, token: &AuthToken) {
        let config = RealtimeClientConfig::new(self.config.api.effective_ws_url());
        let mut client = RealtimeClient::new(config);

        match client.connect(token.as_str()) {
            Ok(rx) => {
                info!("Realtime connection initiated");
                self.realtime_rx = Some(rx);
                self.realtime_client = Some(client);
                if let Some(market) = self.market_mut() {
                    market.set_connection_status(ConnectionStatus::Connecting);
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to initiate realtime connection");
            }
        }
    }

    fn disconnect_realtime(&mut self) {
        if let Some(client) = &self.realtime_client {
            client.disconnect();
        }
        self.realtime_client = None;
        self.realtime_rx = None;
    }

    fn handle_realtime_event(&mut self, event: RealtimeEvent) {
        match &event {
            RealtimeEvent::Connected => info!("Realtime connected"),
            RealtimeEvent::Disconnected { reason, will_retry } => {
                warn!(reason = %reason, will_retry, "Realtime disconnected");
            }
            RealtimeEvent::Reconnecting { attempt } => info!(attempt, "Realtime reconnecting"),
            RealtimeEvent::Error {
                message,
                recoverable,
            } => {
                if *recoverable {
                    warn!(error = %message, "Recoverable realtime error");
                } else {
                    error!(error = %message, "Fatal realtime error");
                }
            }
            _ => debug!(event = ?event, "Realtime event"),
        }

        let Some(market) = self.market_mut() else {
            return;
        };
        let requests = market.on_realtime(event);
        self.process_requests(requests);
    }

    fn process_requests(&mut self, requests: Vec<MarketRequest>) {
        for request in requests {
            match request {
                MarketRequest::Quit => {
                    info!("Quit requested");
                    self.state = AppState::Exiting;
                }
                MarketRequest::Logout => self.logout(),
                MarketRequest::Command(command) => self.send_command(command),
                MarketRequest::OpenInBrowser(id) => {
                    let web_url = self.config.api.effective_web_url();
                    if let Err(e) = browser::open_listing(&web_url, id) {
                        warn!(listing_id = %id, error = %e, "Failed to open browser");
                        self.notifications.error("Browser", e.user_message());
                    }
                }
                MarketRequest::Toast {
                    level,
                    title,
                    message,
                } => self.notifications.notify(level, title, message),
                MarketRequest::PreferencesChanged => self.save_preferences(),
                MarketRequest::DesktopNotify { title, body } => {
                    self.notifier.send(&title, &body);
                    self.notifier.play_sound();
                }
            }
        }
    }

    fn send_command(&self, command: BackendCommand) {
        let Some(tx) = &self.command_tx else {
            debug!(command = ?command, "No backend for command");
            return;
        };
        if tx.send(command).is_err() {
            warn!("Backend worker is gone, command dropped");
        }
    }

    fn save_preferences(&mut self) {
        let stored_sound = self.preferences.notification_sound;
        if let CurrentScreen::Loading(_, market) | CurrentScreen::Market(market) = &self.screen {
            market.fill_preferences(&mut self.preferences);
            if let Some(sound) = self.preferences.notification_sound {
                self.notifier.set_sound_enabled(sound);
                if self.sound_override == Some(sound) {
                    self.preferences.notification_sound = stored_sound;
                }
            }
        }
        if let Err(e) = self.storage.save_preferences(&self.preferences) {
            warn!(error = %e, "Failed to save preferences");
        }
    }

    fn end_session(&mut self) {
        if self.market().is_some() {
            self.save_preferences();
        }
        self.disconnect_realtime();
        self.command_tx = None;
        self.current_token = None;
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        self.action_tx = action_tx;
        self.action_rx = action_rx;
        self.state = AppState::Login;
        self.screen = CurrentScreen::Login(LoginScreen::new());
    }

    fn logout(&mut self) {
        info!("Logging out");
        self.end_session();
        self.delete_stored_token();
    }

    fn expire_session(&mut self, message: String) {
        self.end_session();
        self.delete_stored_token();
        if let CurrentScreen::Login(screen) = &mut self.screen {
            screen.set_error(message);
        }
    }

    fn delete_stored_token(&self) {
        let use_case = self.login_use_case.clone();
        tokio::spawn(async move {
            if let Err(e) = use_case.logout().await {
                warn!(error = %e, "Stored token could not be deleted");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::ToastLevel;
    use crate::domain::ports::mocks::{
        MOCK_TOKEN, MockAuthPort, MockMarketplace, MockNotificationPort, MockTokenStorage,
    };
    use crate::domain::entities::User;

    struct Harness {
        app: App,
        notifier: Arc<MockNotificationPort>,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.api.realtime = false;
        let notifier = Arc::new(MockNotificationPort::new());
        let ports = AppPorts {
            auth: Arc::new(MockAuthPort::new(true)),
            marketplace: Arc::new(MockMarketplace::new()),
            token_storage: Arc::new(MockTokenStorage::new()),
            notifier: notifier.clone(),
        };
        let app = App::new(
            config,
            StorageManager::with_dir(dir.path().to_path_buf()),
            Preferences::default(),
            ports,
        );
        Harness {
            app,
            notifier,
            _dir: dir,
        }
    }

    fn login_response() -> LoginResponse {
        LoginResponse {
            user: User::new(1_u64, "Ada", "ada@example.com"),
            token: AuthToken::new_unchecked(MOCK_TOKEN),
            token_source: TokenSource::Credentials,
            token_persisted: true,
        }
    }

    async fn next_action(app: &mut App) -> Action {
        tokio::time::timeout(Duration::from_secs(2), app.action_rx.recv())
            .await
            .expect("backend answered in time")
            .expect("action channel open")
    }

    #[test]
    fn test_app_starts_at_login() {
        let h = harness();
        assert_eq!(h.app.state, AppState::Login);
        assert!(h.app.market().is_none());
    }

    #[tokio::test]
    async fn test_login_loads_then_shows_market() {
        let mut h = harness();
        h.app.handle_action(Action::LoginFinished(Ok(login_response())));
        assert_eq!(h.app.state, AppState::Loading);
        assert!(h.app.current_token.is_some());

        let action = next_action(&mut h.app).await;
        assert!(matches!(action, Action::InitialDataLoaded(_)));
        h.app.handle_action(action);

        assert_eq!(h.app.state, AppState::Market);
        assert!(matches!(h.app.screen, CurrentScreen::Market(_)));
    }

    #[tokio::test]
    async fn test_failed_login_stays_on_login_screen() {
        let mut h = harness();
        h.app
            .handle_action(Action::LoginFinished(Err(ApiError::InvalidCredentials)));
        assert_eq!(h.app.state, AppState::Login);
        let CurrentScreen::Login(screen) = &h.app.screen else {
            panic!("expected login screen");
        };
        assert_eq!(screen.state(), super::super::login_screen::LoginState::Error);
    }

    #[tokio::test]
    async fn test_rejected_session_returns_to_login() {
        let mut h = harness();
        h.app.handle_action(Action::LoginFinished(Ok(login_response())));

        h.app
            .handle_action(Action::CreditsLoaded(Err(ApiError::rejected("expired"))));

        assert_eq!(h.app.state, AppState::Login);
        assert!(h.app.current_token.is_none());
        assert!(h.app.command_tx.is_none());
    }

    #[tokio::test]
    async fn test_logout_request_ends_session() {
        let mut h = harness();
        h.app.handle_action(Action::LoginFinished(Ok(login_response())));
        h.app.process_requests(vec![MarketRequest::Logout]);

        assert_eq!(h.app.state, AppState::Login);
        assert!(h.app.market().is_none());
    }

    #[tokio::test]
    async fn test_quit_request_exits() {
        let mut h = harness();
        h.app.process_requests(vec![MarketRequest::Quit]);
        assert_eq!(h.app.state, AppState::Exiting);
    }

    #[tokio::test]
    async fn test_toast_and_desktop_requests() {
        let mut h = harness();
        h.app.process_requests(vec![
            MarketRequest::Toast {
                level: ToastLevel::Error,
                title: "Listings".to_string(),
                message: "Could not reach the marketplace".to_string(),
            },
            MarketRequest::DesktopNotify {
                title: "New message".to_string(),
                body: "Is it still available?".to_string(),
            },
        ]);

        assert_eq!(
            h.app.notifications.current_notification().map(|t| t.title.as_str()),
            Some("Listings")
        );
        assert_eq!(h.notifier.notifications.lock().unwrap().len(), 1);
        assert_eq!(h.notifier.sound_count(), 1);
    }

    #[tokio::test]
    async fn test_preferences_are_written_on_change() {
        let mut h = harness();
        h.app.handle_action(Action::LoginFinished(Ok(login_response())));
        h.app.process_requests(vec![MarketRequest::PreferencesChanged]);

        let saved = h.app.storage.load_preferences().unwrap();
        assert_eq!(saved.last_tab.as_deref(), Some("browse"));
    }

    #[tokio::test]
    async fn test_sound_override_is_not_persisted() {
        let mut h = harness();
        h.app = h.app.with_sound_override(Some(false));
        h.app.handle_action(Action::LoginFinished(Ok(login_response())));

        let mut live = Preferences::default();
        h.app.market().unwrap().fill_preferences(&mut live);
        assert_eq!(live.notification_sound, Some(false));

        h.app.process_requests(vec![MarketRequest::PreferencesChanged]);
        let saved = h.app.storage.load_preferences().unwrap();
        assert_eq!(saved.notification_sound, None);
        assert_eq!(saved.last_tab.as_deref(), Some("browse"));
    }
}
