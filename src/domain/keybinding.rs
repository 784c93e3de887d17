use crossterm::event::KeyEvent;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// User-facing commands that keys can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Quit,
    Logout,
    NextTab,
    PreviousTab,
    ToggleSound,

    // Lists
    NavigateUp,
    NavigateDown,
    Select,
    Cancel,
    LoadMore,

    // Browse
    FocusSearch,
    ToggleFavorite,
    OpenInBrowser,
    MessageSeller,
    CycleSort,
    SetLocation,
    ClearFilters,

    // Messages
    Compose,
    RetryMessage,

    // Blog
    ScrollDown,
    ScrollUp,

    // Inbox
    MarkAllRead,

    // Admin
    SwitchPane,
    BanUser,
    UnbanUser,
    ApproveListing,
    RejectListing,
}

/// Screen area where a binding applies. Global bindings apply everywhere
/// unless the active context binds the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Browse,
    Favorites,
    Messages,
    Blog,
    Inbox,
    Credits,
    Admin,
}

impl Action {
    /// Context the action is bound in when remapped from the config file.
    #[must_use]
    pub const fn context(self) -> KeyContext {
        match self {
            Self::Quit
            | Self::Logout
            | Self::NextTab
            | Self::PreviousTab
            | Self::ToggleSound
            | Self::NavigateUp
            | Self::NavigateDown
            | Self::Select
            | Self::Cancel
            | Self::LoadMore => KeyContext::Global,
            Self::FocusSearch
            | Self::ToggleFavorite
            | Self::OpenInBrowser
            | Self::MessageSeller
            | Self::CycleSort
            | Self::SetLocation
            | Self::ClearFilters => KeyContext::Browse,
            Self::Compose | Self::RetryMessage => KeyContext::Messages,
            Self::ScrollDown | Self::ScrollUp => KeyContext::Blog,
            Self::MarkAllRead => KeyContext::Inbox,
            Self::SwitchPane
            | Self::BanUser
            | Self::UnbanUser
            | Self::ApproveListing
            | Self::RejectListing => KeyContext::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybind {
    pub key: KeyEvent,
    pub action: Action,
    pub label: Cow<'static, str>,
    pub key_display: Option<Cow<'static, str>>,
    pub visible_in_bar: bool,
}

impl Keybind {
    pub fn new(key: KeyEvent, action: Action, label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key,
            action,
            label: label.into(),
            key_display: None,
            visible_in_bar: true,
        }
    }

    #[must_use]
    pub fn with_display(mut self, display: impl Into<Cow<'static, str>>) -> Self {
        self.key_display = Some(display.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible_in_bar = false;
        self
    }
}
