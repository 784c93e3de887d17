use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, StatefulWidget, TableState,
        Widget, Wrap,
    },
};
use tracing::debug;

use super::{MarketContext, MarketRequest, ViewSettings, at_end, step};
use crate::application::services::{Suggestion, SuggestionKind};
use crate::domain::entities::{Listing, ListingId, Location};
use crate::domain::errors::ApiError;
use crate::domain::filters::{ListingFilter, SortOrder};
use crate::domain::keybinding::{Action, Keybind};
use crate::domain::pagination::{Generation, Page, PageRequest, PagedList};
use crate::domain::search::parse_search_query;
use crate::presentation::commands::{CommandRegistry, HasCommands};
use crate::presentation::theme::Theme;
use crate::presentation::ui::backend::BackendCommand;
use crate::presentation::widgets::{ListingTable, TextInput};

const SEARCH_PLACEHOLDER: &str = "words #category @location $min-max sort:price_asc";
const LOCATION_PLACEHOLDER: &str = "City or area, leave empty to clear";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Search,
    Location,
}

/// Listing search with filter chips, the result table and a detail panel.
pub struct BrowseView {
    listings: PagedList<Listing>,
    table_state: TableState,
    input: TextInput,
    input_mode: Option<InputMode>,
    /// Search text put aside while the box edits the location.
    saved_search: String,
    suggestions: Vec<Suggestion>,
    suggestion_state: ListState,
    /// Criteria parsed from the search box; sort and location live elsewhere.
    query: ListingFilter,
    sort: SortOrder,
    show_detail: bool,
}

impl BrowseView {
    #[must_use]
    pub fn new(settings: &ViewSettings, theme: &Theme) -> Self {
        Self {
            listings: PagedList::new(settings.page_size),
            table_state: TableState::default(),
            input: TextInput::new(" Search ")
                .placeholder(SEARCH_PLACEHOLDER)
                .accent(theme.accent),
            input_mode: None,
            saved_search: String::new(),
            suggestions: Vec::new(),
            suggestion_state: ListState::default(),
            query: ListingFilter::new(),
            sort: SortOrder::default(),
            show_detail: false,
        }
    }

    #[must_use]
    pub fn listings(&self) -> &[Listing] {
        self.listings.items()
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.input_mode.is_some()
    }

    #[must_use]
    pub const fn sort(&self) -> SortOrder {
        self.sort
    }

    #[must_use]
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Query, sort and the location preference combined; the search box wins.
    #[must_use]
    pub fn effective_filter(&self, ctx: &MarketContext) -> ListingFilter {
        let mut base = ListingFilter::new().with_sort(self.sort);
        if let Some(location) = &ctx.location {
            base = base.with_location(location.clone());
        }
        base.merge(&self.query)
    }

    fn selected(&self) -> Option<&Listing> {
        self.table_state
            .selected()
            .and_then(|i| self.listings.items().get(i))
    }

    /// First page request for the initial load.
    pub fn begin_initial(&mut self) -> (Generation, PageRequest) {
        self.table_state.select(None);
        self.listings.begin_reset()
    }

    /// Clears the loading state when the initial page never arrived.
    pub fn fail_initial(&mut self) {
        self.listings.fail(self.listings.generation());
    }

    /// Restarts the listing query with the current filter.
    pub fn reload(&mut self, ctx: &MarketContext) -> Vec<MarketRequest> {
        let filter = self.effective_filter(ctx);
        if let Err(e) = filter.validate() {
            return vec![MarketRequest::warn("Search", e.user_message())];
        }
        let (generation, page) = self.listings.begin_reset();
        self.table_state.select(None);
        self.show_detail = false;
        debug!(filter = ?filter, "Reloading listings");
        vec![MarketRequest::Command(BackendCommand::LoadListings {
            filter,
            generation,
            page,
        })]
    }

    fn load_more(&mut self, ctx: &MarketContext) -> Vec<MarketRequest> {
        let filter = self.effective_filter(ctx);
        match self.listings.begin_next() {
            Some((generation, page)) => vec![MarketRequest::Command(BackendCommand::LoadListings {
                filter,
                generation,
                page,
            })],
            None => Vec::new(),
        }
    }

    pub fn handle_action(&mut self, action: Action, ctx: &mut MarketContext) -> Vec<MarketRequest> {
        match action {
            Action::NavigateDown => {
                let len = self.listings.len();
                self.table_state
                    .select(step(self.table_state.selected(), len, 1));
                if at_end(self.table_state.selected(), len) {
                    return self.load_more(ctx);
                }
                Vec::new()
            }
            Action::NavigateUp => {
                self.table_state
                    .select(step(self.table_state.selected(), self.listings.len(), -1));
                Vec::new()
            }
            Action::LoadMore => self.load_more(ctx),
            Action::Select => {
                let Some(id) = self.selected().map(Listing::id) else {
                    return Vec::new();
                };
                self.show_detail = !self.show_detail;
                if self.show_detail {
                    vec![MarketRequest::Command(BackendCommand::LoadListing(id))]
                } else {
                    Vec::new()
                }
            }
            Action::Cancel => {
                self.show_detail = false;
                Vec::new()
            }
            Action::FocusSearch => {
                self.begin_editing(InputMode::Search, ctx);
                Vec::new()
            }
            Action::SetLocation => {
                self.begin_editing(InputMode::Location, ctx);
                Vec::new()
            }
            Action::ToggleFavorite => {
                let Some(id) = self.selected().map(Listing::id) else {
                    return Vec::new();
                };
                let intent = ctx.favorites.toggle(id);
                if let Some(listing) = self.listings.get_mut(id) {
                    listing.set_favorite(intent.desired);
                }
                vec![MarketRequest::Command(BackendCommand::CommitFavorite(intent))]
            }
            Action::OpenInBrowser => self
                .selected()
                .map(|l| vec![MarketRequest::OpenInBrowser(l.id())])
                .unwrap_or_default(),
            Action::MessageSeller => {
                let Some(listing) = self.selected() else {
                    return Vec::new();
                };
                if listing.seller().id == ctx.user.id() {
                    return vec![MarketRequest::warn("Messages", "This is your own listing")];
                }
                let body = format!("Hi! Is \"{}\" still available?", listing.title());
                vec![MarketRequest::Command(BackendCommand::StartConversation {
                    listing_id: listing.id(),
                    body,
                })]
            }
            Action::CycleSort => {
                self.sort = self.sort.cycle();
                self.reload(ctx)
            }
            Action::ClearFilters => {
                self.query = ListingFilter::new();
                self.sort = SortOrder::default();
                self.input.clear();
                let mut requests = Vec::new();
                if ctx.location.take().is_some() {
                    requests.push(MarketRequest::PreferencesChanged);
                }
                requests.extend(self.reload(ctx));
                requests
            }
            _ => Vec::new(),
        }
    }

    fn begin_editing(&mut self, mode: InputMode, ctx: &MarketContext) {
        match mode {
            InputMode::Search => {
                self.input.set_label(" Search ");
                self.input.set_placeholder(SEARCH_PLACEHOLDER);
            }
            InputMode::Location => {
                self.input.set_label(" Location ");
                self.input.set_placeholder(LOCATION_PLACEHOLDER);
                self.saved_search = self.input.value().to_string();
                let current = ctx.location.as_ref().map(|l| l.name.clone());
                self.input.set_value(current.unwrap_or_default());
            }
        }
        self.input_mode = Some(mode);
        self.input.set_focused(true);
        self.refresh_suggestions(ctx);
    }

    fn finish_editing(&mut self) {
        if self.input_mode == Some(InputMode::Location) {
            self.input.set_label(" Search ");
            self.input.set_placeholder(SEARCH_PLACEHOLDER);
            self.input.set_value(std::mem::take(&mut self.saved_search));
        }
        self.input_mode = None;
        self.input.set_focused(false);
        self.suggestions.clear();
        self.suggestion_state.select(None);
    }

    fn refresh_suggestions(&mut self, ctx: &MarketContext) {
        self.suggestion_state.select(None);
        if self.input_mode != Some(InputMode::Search) {
            self.suggestions.clear();
            return;
        }
        let value = self.input.value();
        let prefix = match last_token(value) {
            Some(token) if token.starts_with('#') => token,
            _ => value,
        };
        self.suggestions = ctx.search.suggestions(prefix, &ctx.categories);
    }

    fn accept_suggestion(&mut self) -> bool {
        let Some(suggestion) = self
            .suggestion_state
            .selected()
            .and_then(|i| self.suggestions.get(i))
        else {
            return false;
        };
        let completed = apply_suggestion(self.input.value(), suggestion);
        self.input.set_value(completed);
        true
    }

    /// Keys while the search or location box has focus.
    pub fn handle_input_key(&mut self, key: KeyEvent, ctx: &mut MarketContext) -> Vec<MarketRequest> {
        let Some(mode) = self.input_mode else {
            return Vec::new();
        };
        match key.code {
            KeyCode::Esc => {
                self.finish_editing();
                Vec::new()
            }
            KeyCode::Enter => {
                self.accept_suggestion();
                let text = self.input.value().trim().to_string();
                self.finish_editing();
                match mode {
                    InputMode::Search => self.submit_search(&text, ctx),
                    InputMode::Location => self.submit_location(&text, ctx),
                }
            }
            KeyCode::Down => {
                let next = step(self.suggestion_state.selected(), self.suggestions.len(), 1);
                self.suggestion_state.select(next);
                Vec::new()
            }
            KeyCode::Up => {
                let current = self.suggestion_state.selected();
                self.suggestion_state
                    .select(current.filter(|i| *i > 0).map(|i| i - 1));
                Vec::new()
            }
            KeyCode::Tab => {
                if self.accept_suggestion() {
                    self.refresh_suggestions(ctx);
                }
                Vec::new()
            }
            KeyCode::Delete if key.modifiers.contains(KeyModifiers::SHIFT) => {
                // Shift+Delete forgets the highlighted recent search.
                let forgotten = self
                    .suggestion_state
                    .selected()
                    .and_then(|i| self.suggestions.get(i))
                    .filter(|s| s.kind == SuggestionKind::Recent)
                    .map(|s| s.text.clone());
                match forgotten {
                    Some(term) if ctx.search.forget(&term) => {
                        self.refresh_suggestions(ctx);
                        vec![MarketRequest::PreferencesChanged]
                    }
                    _ => Vec::new(),
                }
            }
            _ => {
                if self.input.handle_key(key) {
                    self.refresh_suggestions(ctx);
                }
                Vec::new()
            }
        }
    }

    fn submit_search(&mut self, text: &str, ctx: &mut MarketContext) -> Vec<MarketRequest> {
        let parsed = parse_search_query(text);
        let (mut resolved, warning) = ctx.search.resolve_category(parsed, &ctx.categories);
        let sort = if resolved.sort == SortOrder::Newest {
            self.sort
        } else {
            resolved.sort
        };
        resolved.sort = SortOrder::Newest;

        let mut requests = Vec::new();
        if let Some(warning) = warning {
            requests.push(MarketRequest::warn("Search", warning));
        }

        let previous = (
            std::mem::replace(&mut self.query, resolved),
            std::mem::replace(&mut self.sort, sort),
        );
        if let Err(e) = self.effective_filter(ctx).validate() {
            (self.query, self.sort) = previous;
            requests.push(MarketRequest::warn("Search", e.user_message()));
            return requests;
        }
        if !text.is_empty() && ctx.search.record(text) {
            requests.push(MarketRequest::PreferencesChanged);
        }
        requests.extend(self.reload(ctx));
        requests
    }

    fn submit_location(&mut self, text: &str, ctx: &mut MarketContext) -> Vec<MarketRequest> {
        let location = Location::named(text);
        let message = location.as_ref().map_or_else(
            || String::from("Showing listings everywhere"),
            |l| format!("Showing listings near {}", l.label()),
        );
        if location == ctx.location {
            return Vec::new();
        }
        ctx.location = location;

        let mut requests = vec![
            MarketRequest::PreferencesChanged,
            MarketRequest::info("Location", message),
        ];
        requests.extend(self.reload(ctx));
        requests
    }

    pub fn set_initial_page(&mut self, generation: Generation, page: Page<Listing>, ctx: &MarketContext) {
        self.on_listings_loaded(generation, Ok(page), ctx);
    }

    pub fn on_listings_loaded(
        &mut self,
        generation: Generation,
        result: Result<Page<Listing>, ApiError>,
        ctx: &MarketContext,
    ) {
        match result {
            Ok(mut page) => {
                ctx.overlay_favorites(&mut page.items);
                if self.listings.apply(generation, page)
                    && self.table_state.selected().is_none()
                    && !self.listings.is_empty()
                {
                    self.table_state.select(Some(0));
                }
            }
            Err(_) => self.listings.fail(generation),
        }
    }

    pub fn on_listing_loaded(&mut self, mut listing: Listing, ctx: &MarketContext) {
        listing.set_favorite(ctx.favorites.is_favorite(listing.id()));
        self.listings.replace_item(listing);
    }

    /// Re-reads the optimistic state after a toggle settled.
    pub fn refresh_favorite(&mut self, id: ListingId, ctx: &MarketContext) {
        if let Some(listing) = self.listings.get_mut(id) {
            listing.set_favorite(ctx.favorites.is_favorite(id));
        }
    }

    pub fn render(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let [input_area, chips_area, body_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .areas(area);

        (&self.input).render(input_area, buf);
        self.render_chips(ctx, chips_area, buf);

        let table_area = if self.show_detail {
            let [table_area, detail_area] =
                Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)]).areas(body_area);
            if let Some(listing) = self.selected() {
                render_detail(listing, ctx, detail_area, buf);
            }
            table_area
        } else {
            body_area
        };

        let title = match self.listings.total() {
            Some(total) => format!(" Listings ({}/{total}) ", self.listings.len()),
            None => format!(" Listings ({}) ", self.listings.len()),
        };
        let table = ListingTable::new(self.listings.items(), &ctx.theme)
            .title(title)
            .date_format(&ctx.settings.date_format)
            .show_images_count(ctx.settings.show_images_count)
            .loading(self.listings.is_loading())
            .empty_message("No listings match your search")
            .focused(!self.is_editing());
        StatefulWidget::render(table, table_area, buf, &mut self.table_state);

        if self.is_editing() && !self.suggestions.is_empty() {
            self.render_suggestions(&ctx.theme, input_area, area, buf);
        }
    }

    fn render_chips(&self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let chips = self.effective_filter(ctx).chips();
        let mut spans = vec![Span::raw(" ")];
        if chips.is_empty() {
            spans.push(Span::styled("All listings", ctx.theme.dimmed_style));
        }
        for chip in chips {
            spans.push(Span::styled(
                format!("[{chip}]"),
                ctx.theme.highlight_style,
            ));
            spans.push(Span::raw(" "));
        }
        if self.listings.is_exhausted() && !self.listings.is_empty() {
            spans.push(Span::styled("· end of results", ctx.theme.dimmed_style));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_suggestions(&mut self, theme: &Theme, input_area: Rect, bounds: Rect, buf: &mut Buffer) {
        let height = u16::try_from(self.suggestions.len())
            .unwrap_or(u16::MAX)
            .saturating_add(2);
        let popup = Rect::new(
            input_area.x + 1,
            input_area.bottom(),
            input_area.width.saturating_sub(2).min(50),
            height,
        )
        .intersection(bounds);
        if popup.area() == 0 {
            return;
        }

        let items: Vec<ListItem<'_>> = self
            .suggestions
            .iter()
            .map(|s| {
                let (icon, style) = match s.kind {
                    SuggestionKind::Recent => ("↺ ", theme.dimmed_style),
                    SuggestionKind::Category => ("# ", Style::default().fg(theme.accent)),
                };
                ListItem::new(Line::from(vec![Span::styled(icon, style), Span::raw(s.text.as_str())]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.accent))
                    .title(" Suggestions "),
            )
            .highlight_style(theme.selection_style);

        Clear.render(popup, buf);
        StatefulWidget::render(list, popup, buf, &mut self.suggestion_state);
    }
}

fn render_detail(listing: &Listing, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
    let theme = &ctx.theme;
    let label = |name: &'static str| Span::styled(format!("{name:<10}"), theme.dimmed_style);
    let posted = listing
        .created_at()
        .with_timezone(&Local)
        .format(&ctx.settings.date_format)
        .to_string();

    let mut lines = vec![
        Line::from(Span::styled(
            listing.title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(listing.price().to_string(), theme.price_style)),
        Line::default(),
        Line::from(vec![label("Status"), Span::raw(listing.status().label())]),
        Line::from(vec![label("Category"), Span::raw(listing.category_label().to_string())]),
        Line::from(vec![label("Location"), Span::raw(listing.location_label().to_string())]),
        Line::from(vec![label("Seller"), Span::raw(listing.seller_label().to_string())]),
        Line::from(vec![label("Posted"), Span::raw(posted)]),
        Line::from(vec![label("Views"), Span::raw(listing.views().to_string())]),
    ];
    if !listing.images().is_empty() {
        lines.push(Line::from(vec![
            label("Images"),
            Span::raw(listing.images().len().to_string()),
        ]));
    }
    lines.push(Line::default());
    if listing.description().is_empty() {
        lines.push(Line::from(Span::styled("No description", theme.dimmed_style)));
    } else {
        lines.extend(listing.description().lines().map(|l| Line::from(l.to_string())));
    }

    let star = if listing.is_favorite() { " ★ " } else { " " };
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent))
                .title(format!("{star}Details ")),
        )
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

fn last_token(value: &str) -> Option<&str> {
    if value.ends_with(char::is_whitespace) {
        return None;
    }
    value.split_whitespace().last()
}

/// Category suggestions replace the `#word` being typed; recent searches
/// replace the whole entry.
fn apply_suggestion(value: &str, suggestion: &Suggestion) -> String {
    match suggestion.kind {
        SuggestionKind::Recent => suggestion.completion(),
        SuggestionKind::Category => {
            let keep = match last_token(value) {
                Some(token) => &value[..value.len() - token.len()],
                None => value,
            };
            format!("{keep}{} ", suggestion.completion())
        }
    }
}

impl HasCommands for BrowseView {
    fn get_commands(&self, registry: &CommandRegistry) -> Vec<Keybind> {
        if self.is_editing() {
            let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
            return vec![
                Keybind::new(key(KeyCode::Enter), Action::Select, "Apply"),
                Keybind::new(key(KeyCode::Tab), Action::Select, "Complete"),
                Keybind::new(key(KeyCode::Esc), Action::Cancel, "Cancel"),
            ];
        }
        [
            (Action::FocusSearch, "Search"),
            (Action::Select, "Details"),
            (Action::ToggleFavorite, "Favorite"),
            (Action::OpenInBrowser, "Open"),
            (Action::MessageSeller, "Message"),
            (Action::CycleSort, "Sort"),
            (Action::SetLocation, "Location"),
            (Action::ClearFilters, "Clear"),
            (Action::LoadMore, "More"),
        ]
        .into_iter()
        .filter_map(|(action, label)| registry.keybind(action, label))
        .collect()
    }
}
