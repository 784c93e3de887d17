//! Tab views of the market screen.
//!
//! Each view owns its list state and turns keys and backend actions into
//! [`MarketRequest`]s. State shared between tabs lives in [`MarketContext`].

mod admin;
mod blog;
mod browse;
mod credits;
mod favorites;
mod inbox;
mod messages;

pub use admin::{AdminPane, AdminView};
pub use blog::BlogView;
pub use browse::BrowseView;
pub use credits::CreditsView;
pub use favorites::FavoritesView;
pub use inbox::InboxView;
pub use messages::MessagesView;

use std::sync::Arc;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::application::services::{FavoritesService, SearchService};
use crate::domain::ConnectionStatus;
use crate::domain::entities::{Category, Listing, ListingId, Location, User};
use crate::domain::notification::ToastLevel;
use crate::presentation::commands::CommandRegistry;
use crate::presentation::theme::Theme;
use crate::presentation::ui::backend::BackendCommand;

/// What the market screen asks the app to do.
#[derive(Debug)]
pub enum MarketRequest {
    Quit,
    Logout,
    Command(BackendCommand),
    OpenInBrowser(ListingId),
    Toast {
        level: ToastLevel,
        title: String,
        message: String,
    },
    /// Location, recent searches, sound or last tab changed.
    PreferencesChanged,
    DesktopNotify {
        title: String,
        body: String,
    },
}

impl MarketRequest {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warn(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Warn,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Display settings taken from the `[ui]` and `[api]` config sections.
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub date_format: String,
    pub show_images_count: bool,
    pub page_size: u32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            date_format: String::from("%Y-%m-%d"),
            show_images_count: true,
            page_size: 20,
        }
    }
}

/// Session state every tab reads.
pub struct MarketContext {
    pub user: User,
    pub theme: Theme,
    pub registry: Arc<CommandRegistry>,
    pub settings: ViewSettings,
    pub favorites: FavoritesService,
    pub search: SearchService,
    pub categories: Vec<Category>,
    pub location: Option<Location>,
    pub credits: Option<i64>,
    pub connection: ConnectionStatus,
    pub notification_sound: bool,
}

impl MarketContext {
    /// Overlays the optimistic favorite state onto freshly loaded listings.
    pub fn overlay_favorites(&self, listings: &mut [Listing]) {
        for listing in listings {
            listing.set_favorite(self.favorites.is_favorite(listing.id()));
        }
    }
}

/// Moves a list selection by `delta`, clamped to the list.
pub(crate) fn step(selected: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match selected {
        None => 0,
        Some(index) => index.saturating_add_signed(delta).min(len - 1),
    };
    Some(next)
}

/// Whether the selection sits on the last loaded row.
pub(crate) fn at_end(selected: Option<usize>, len: usize) -> bool {
    len > 0 && selected.is_some_and(|index| index + 1 >= len)
}

/// Bordered box with a single dimmed line, for empty and placeholder panes.
pub(crate) fn render_placeholder(
    title: &str,
    message: &str,
    theme: &Theme,
    area: Rect,
    buf: &mut Buffer,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.dimmed_style)
        .title(title.to_string());
    Paragraph::new(message.to_string())
        .style(theme.dimmed_style)
        .block(block)
        .render(area, buf);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::entities::{Money, SellerSummary, UserId, UserRole};
    use crate::domain::ports::mocks::MockMarketplace;
    use crate::domain::search::RecentSearches;
    use chrono::Utc;

    pub fn context_for(user: User) -> MarketContext {
        MarketContext {
            user,
            theme: Theme::default(),
            registry: Arc::new(CommandRegistry::new()),
            settings: ViewSettings::default(),
            favorites: FavoritesService::new(Arc::new(MockMarketplace::new())),
            search: SearchService::new(RecentSearches::new()),
            categories: vec![Category::new(1_u64, "Books"), Category::new(2_u64, "Furniture")],
            location: None,
            credits: Some(10),
            connection: ConnectionStatus::Connected,
            notification_sound: true,
        }
    }

    pub fn context() -> MarketContext {
        context_for(User::new(1_u64, "Me", "me@example.com").with_role(UserRole::Admin))
    }

    pub fn listing(id: u64, seller: u64) -> Listing {
        Listing::new(
            id,
            format!("Item {id}"),
            &Money::new(1_000, "EUR"),
            SellerSummary {
                id: UserId(seller),
                name: format!("Seller {seller}"),
            },
            Utc::now(),
        )
    }

    pub fn commands(requests: &[MarketRequest]) -> Vec<&BackendCommand> {
        requests
            .iter()
            .filter_map(|r| match r {
                MarketRequest::Command(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn toasts(requests: &[MarketRequest]) -> Vec<(ToastLevel, &str)> {
        requests
            .iter()
            .filter_map(|r| match r {
                MarketRequest::Toast { level, message, .. } => Some((*level, message.as_str())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_clamps() {
        assert_eq!(step(None, 0, 1), None);
        assert_eq!(step(None, 3, 1), Some(0));
        assert_eq!(step(Some(0), 3, -1), Some(0));
        assert_eq!(step(Some(1), 3, 1), Some(2));
        assert_eq!(step(Some(2), 3, 1), Some(2));
        assert_eq!(step(Some(0), 30, 10), Some(10));
    }

    #[test]
    fn test_at_end() {
        assert!(!at_end(None, 3));
        assert!(!at_end(Some(1), 3));
        assert!(at_end(Some(2), 3));
        assert!(!at_end(Some(0), 0));
    }
}
