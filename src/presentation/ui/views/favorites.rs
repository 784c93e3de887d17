use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{StatefulWidget, TableState},
};

use super::{MarketContext, MarketRequest, ViewSettings, at_end, step};
use crate::application::services::CommitOutcome;
use crate::domain::entities::{Listing, ListingId};
use crate::domain::errors::ApiError;
use crate::domain::favorites::FavoriteIntent;
use crate::domain::keybinding::{Action, Keybind};
use crate::domain::pagination::{Generation, Page, PagedList};
use crate::presentation::commands::{CommandRegistry, HasCommands};
use crate::presentation::ui::backend::BackendCommand;
use crate::presentation::widgets::ListingTable;

/// The user's favorite listings.
///
/// Unfavoriting removes the row at once; the row comes back if the backend
/// refuses the change.
pub struct FavoritesView {
    list: PagedList<Listing>,
    table_state: TableState,
    loaded: bool,
    /// Optimistically removed rows, keyed by id, waiting for their commit.
    removed: HashMap<ListingId, Listing>,
}

impl FavoritesView {
    #[must_use]
    pub fn new(settings: &ViewSettings) -> Self {
        Self {
            list: PagedList::new(settings.page_size),
            table_state: TableState::default(),
            loaded: false,
            removed: HashMap::new(),
        }
    }

    #[must_use]
    pub fn listings(&self) -> &[Listing] {
        self.list.items()
    }

    /// Loads the first page the first time the tab is shown.
    pub fn on_activate(&mut self) -> Vec<MarketRequest> {
        if self.loaded {
            return Vec::new();
        }
        self.reload()
    }

    pub fn reload(&mut self) -> Vec<MarketRequest> {
        self.loaded = true;
        self.table_state.select(None);
        let (generation, page) = self.list.begin_reset();
        vec![MarketRequest::Command(BackendCommand::LoadFavorites { generation, page })]
    }

    fn load_more(&mut self) -> Vec<MarketRequest> {
        match self.list.begin_next() {
            Some((generation, page)) => {
                vec![MarketRequest::Command(BackendCommand::LoadFavorites { generation, page })]
            }
            None => Vec::new(),
        }
    }

    fn selected_id(&self) -> Option<ListingId> {
        self.table_state
            .selected()
            .and_then(|i| self.list.items().get(i))
            .map(Listing::id)
    }

    pub fn handle_action(&mut self, action: Action, ctx: &mut MarketContext) -> Vec<MarketRequest> {
        match action {
            Action::NavigateDown => {
                let len = self.list.len();
                self.table_state.select(step(self.table_state.selected(), len, 1));
                if at_end(self.table_state.selected(), len) {
                    return self.load_more();
                }
                Vec::new()
            }
            Action::NavigateUp => {
                self.table_state
                    .select(step(self.table_state.selected(), self.list.len(), -1));
                Vec::new()
            }
            Action::LoadMore => self.load_more(),
            Action::ToggleFavorite => {
                let Some(id) = self.selected_id() else {
                    return Vec::new();
                };
                let intent = ctx.favorites.toggle(id);
                if intent.desired {
                    if let Some(listing) = self.list.get_mut(id) {
                        listing.set_favorite(true);
                    }
                } else if let Some(mut listing) = self.list.remove_item(id) {
                    listing.set_favorite(false);
                    self.removed.insert(id, listing);
                    let len = self.list.len();
                    let selected = self
                        .table_state
                        .selected()
                        .filter(|_| len > 0)
                        .map(|i| i.min(len - 1));
                    self.table_state.select(selected);
                }
                vec![MarketRequest::Command(BackendCommand::CommitFavorite(intent))]
            }
            Action::OpenInBrowser => self
                .selected_id()
                .map(|id| vec![MarketRequest::OpenInBrowser(id)])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn on_favorites_loaded(
        &mut self,
        generation: Generation,
        result: Result<Page<Listing>, ApiError>,
        ctx: &MarketContext,
    ) {
        match result {
            Ok(mut page) => {
                ctx.overlay_favorites(&mut page.items);
                // Rows unfavorited while the page was in flight stay hidden.
                page.items.retain(Listing::is_favorite);
                if self.list.apply(generation, page)
                    && self.table_state.selected().is_none()
                    && !self.list.is_empty()
                {
                    self.table_state.select(Some(0));
                }
            }
            Err(_) => self.list.fail(generation),
        }
    }

    /// Settles an optimistic toggle made in any tab.
    pub fn on_favorite_committed(
        &mut self,
        intent: &FavoriteIntent,
        outcome: &CommitOutcome,
        ctx: &MarketContext,
    ) {
        let id = intent.listing_id;
        let visible = ctx.favorites.is_favorite(id);
        match outcome {
            CommitOutcome::RolledBack(_) if visible => {
                if let Some(mut listing) = self.removed.remove(&id) {
                    listing.set_favorite(true);
                    self.list.push_front(listing);
                }
            }
            CommitOutcome::Confirmed if intent.desired && self.list.get_mut(id).is_none() => {
                // Favorited from another tab; show it next time the tab opens.
                self.loaded = false;
            }
            _ => {}
        }
        if !visible {
            self.list.remove_item(id);
        }
        if matches!(outcome, CommitOutcome::Confirmed | CommitOutcome::RolledBack(_)) {
            self.removed.remove(&id);
        }
    }

    pub fn on_listing_updated(&mut self, mut listing: Listing, ctx: &MarketContext) {
        listing.set_favorite(ctx.favorites.is_favorite(listing.id()));
        self.list.replace_item(listing);
    }

    pub fn render(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let title = format!(" Favorites ({}) ", self.list.len());
        let table = ListingTable::new(self.list.items(), &ctx.theme)
            .title(title)
            .date_format(&ctx.settings.date_format)
            .show_images_count(ctx.settings.show_images_count)
            .loading(self.list.is_loading())
            .empty_message("No favorites yet. Press f on a listing in Browse to add one.");
        StatefulWidget::render(table, area, buf, &mut self.table_state);
    }
}

impl HasCommands for FavoritesView {
    fn get_commands(&self, registry: &CommandRegistry) -> Vec<Keybind> {
        [
            (Action::ToggleFavorite, "Unfavorite"),
            (Action::OpenInBrowser, "Open"),
            (Action::LoadMore, "More"),
        ]
        .into_iter()
        .filter_map(|(action, label)| registry.keybind(action, label))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, listing};
    use super::*;
    use crate::application::services::FavoritesService;
    use crate::domain::entities::AuthToken;
    use crate::domain::ports::mocks::{MOCK_TOKEN, MockMarketplace};
    use std::sync::Arc;

    fn loaded(ctx: &MarketContext, ids: &[u64]) -> FavoritesView {
        let mut view = FavoritesView::new(&ctx.settings);
        let requests = view.on_activate();
        let Some(MarketRequest::Command(BackendCommand::LoadFavorites { generation, .. })) =
            requests.first()
        else {
            panic!("expected favorites load");
        };
        let items: Vec<Listing> = ids.iter().map(|id| listing(*id, 2).with_favorite(true)).collect();
        ctx.favorites.sync_from(&items);
        view.on_favorites_loaded(*generation, Ok(Page::new(items, 1, 20, None)), ctx);
        view
    }

    #[tokio::test]
    async fn test_unfavorite_removes_then_restores_on_failure() {
        let port = Arc::new(MockMarketplace::new());
        port.set_fail_writes(true);
        let mut ctx = context();
        ctx.favorites = FavoritesService::new(port);
        let mut view = loaded(&ctx, &[1, 2]);

        let requests = view.handle_action(Action::ToggleFavorite, &mut ctx);
        assert_eq!(view.listings().len(), 1);
        let Some(MarketRequest::Command(BackendCommand::CommitFavorite(intent))) = requests.first()
        else {
            panic!("expected commit");
        };
        assert!(!intent.desired);

        let token = AuthToken::new_unchecked(MOCK_TOKEN);
        let outcome = ctx.favorites.commit(&token, *intent).await;
        assert!(matches!(outcome, CommitOutcome::RolledBack(_)));
        view.on_favorite_committed(intent, &outcome, &ctx);

        assert_eq!(view.listings().len(), 2);
        assert!(view.listings().iter().all(Listing::is_favorite));
    }

    #[test]
    fn test_confirmed_unfavorite_stays_removed() {
        let mut ctx = context();
        let mut view = loaded(&ctx, &[1]);

        let requests = view.handle_action(Action::ToggleFavorite, &mut ctx);
        let Some(MarketRequest::Command(BackendCommand::CommitFavorite(intent))) = requests.first()
        else {
            panic!("expected commit");
        };
        view.on_favorite_committed(intent, &CommitOutcome::Confirmed, &ctx);

        assert!(view.listings().is_empty());
        assert!(view.removed.is_empty());
    }

    #[test]
    fn test_activation_loads_once() {
        let ctx = context();
        let mut view = loaded(&ctx, &[1]);
        assert!(view.on_activate().is_empty());
    }
}
