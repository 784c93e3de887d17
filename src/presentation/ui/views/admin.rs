use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};
use tracing::info;

use super::{MarketContext, MarketRequest, ViewSettings, at_end, render_placeholder, step};
use crate::domain::entities::{
    DashboardStats, Listing, ListingId, ListingStatus, ModerationDecision, User, UserId,
    UserStatus,
};
use crate::domain::errors::ApiError;
use crate::domain::keybinding::{Action, Keybind};
use crate::domain::pagination::{Generation, Page, PagedList};
use crate::presentation::commands::{CommandRegistry, HasCommands};
use crate::presentation::ui::backend::BackendCommand;
use crate::presentation::widgets::ListingTable;

const REJECT_REASON: &str = "Rejected by moderator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminPane {
    #[default]
    Users,
    Moderation,
}

impl AdminPane {
    const fn toggled(self) -> Self {
        match self {
            Self::Users => Self::Moderation,
            Self::Moderation => Self::Users,
        }
    }
}

/// Dashboard for moderators and admins: stats, user management, listing queue.
pub struct AdminView {
    stats: Option<DashboardStats>,
    users: PagedList<User>,
    users_state: TableState,
    queue: PagedList<Listing>,
    queue_state: TableState,
    pane: AdminPane,
    loaded: bool,
}

impl AdminView {
    #[must_use]
    pub fn new(settings: &ViewSettings) -> Self {
        Self {
            stats: None,
            users: PagedList::new(settings.page_size),
            users_state: TableState::default(),
            queue: PagedList::new(settings.page_size),
            queue_state: TableState::default(),
            pane: AdminPane::default(),
            loaded: false,
        }
    }

    #[must_use]
    pub const fn pane(&self) -> AdminPane {
        self.pane
    }

    #[must_use]
    pub const fn stats(&self) -> Option<&DashboardStats> {
        self.stats.as_ref()
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        self.users.items()
    }

    #[must_use]
    pub fn queue(&self) -> &[Listing] {
        self.queue.items()
    }

    pub fn set_stats(&mut self, stats: DashboardStats) {
        self.stats = Some(stats);
    }

    /// Fetches both panes the first time the tab is shown.
    pub fn on_activate(&mut self) -> Vec<MarketRequest> {
        if self.loaded {
            return Vec::new();
        }
        self.loaded = true;
        let (users_generation, users_page) = self.users.begin_reset();
        let (queue_generation, queue_page) = self.queue.begin_reset();
        let mut requests = vec![
            MarketRequest::Command(BackendCommand::LoadAdminUsers {
                generation: users_generation,
                page: users_page,
            }),
            MarketRequest::Command(BackendCommand::LoadModerationQueue {
                generation: queue_generation,
                page: queue_page,
            }),
        ];
        if self.stats.is_none() {
            requests.push(MarketRequest::Command(BackendCommand::LoadAdminStats));
        }
        requests
    }

    fn load_more(&mut self) -> Vec<MarketRequest> {
        let command = match self.pane {
            AdminPane::Users => self
                .users
                .begin_next()
                .map(|(generation, page)| BackendCommand::LoadAdminUsers { generation, page }),
            AdminPane::Moderation => self
                .queue
                .begin_next()
                .map(|(generation, page)| BackendCommand::LoadModerationQueue { generation, page }),
        };
        command.map(MarketRequest::Command).into_iter().collect()
    }

    fn navigate(&mut self, delta: isize) -> Vec<MarketRequest> {
        let (state, len) = match self.pane {
            AdminPane::Users => (&mut self.users_state, self.users.len()),
            AdminPane::Moderation => (&mut self.queue_state, self.queue.len()),
        };
        state.select(step(state.selected(), len, delta));
        if delta > 0 && at_end(state.selected(), len) {
            return self.load_more();
        }
        Vec::new()
    }

    fn selected_user(&self) -> Option<&User> {
        self.users_state
            .selected()
            .and_then(|i| self.users.items().get(i))
    }

    fn selected_listing(&self) -> Option<ListingId> {
        self.queue_state
            .selected()
            .and_then(|i| self.queue.items().get(i))
            .map(Listing::id)
    }

    pub fn handle_action(&mut self, action: Action, ctx: &MarketContext) -> Vec<MarketRequest> {
        match action {
            Action::SwitchPane => {
                self.pane = self.pane.toggled();
                Vec::new()
            }
            Action::NavigateDown => self.navigate(1),
            Action::NavigateUp => self.navigate(-1),
            Action::LoadMore => self.load_more(),
            Action::BanUser if self.pane == AdminPane::Users => {
                self.set_user_status(UserStatus::Banned, ctx)
            }
            Action::UnbanUser if self.pane == AdminPane::Users => {
                self.set_user_status(UserStatus::Active, ctx)
            }
            Action::ApproveListing if self.pane == AdminPane::Moderation => {
                self.moderate(ModerationDecision::Approve)
            }
            Action::RejectListing if self.pane == AdminPane::Moderation => {
                self.moderate(ModerationDecision::reject(REJECT_REASON))
            }
            _ => Vec::new(),
        }
    }

    fn set_user_status(&self, status: UserStatus, ctx: &MarketContext) -> Vec<MarketRequest> {
        if !ctx.user.role().can_manage_users() {
            return vec![MarketRequest::warn("Admin", "Only admins can ban or unban users")];
        }
        let Some(user) = self.selected_user() else {
            return Vec::new();
        };
        if user.id() == ctx.user.id() {
            return vec![MarketRequest::warn("Admin", "You cannot change your own status")];
        }
        if user.status() == status {
            return vec![MarketRequest::info(
                "Admin",
                format!("{} is already {status}", user.display_name()),
            )];
        }
        vec![MarketRequest::Command(BackendCommand::SetUserStatus {
            user_id: user.id(),
            status,
        })]
    }

    fn moderate(&self, decision: ModerationDecision) -> Vec<MarketRequest> {
        self.selected_listing()
            .map(|listing_id| {
                vec![MarketRequest::Command(BackendCommand::ModerateListing {
                    listing_id,
                    decision,
                })]
            })
            .unwrap_or_default()
    }

    pub fn on_users_loaded(&mut self, generation: Generation, result: Result<Page<User>, ApiError>) {
        match result {
            Ok(page) => {
                if self.users.apply(generation, page)
                    && self.users_state.selected().is_none()
                    && !self.users.is_empty()
                {
                    self.users_state.select(Some(0));
                }
            }
            Err(_) => self.users.fail(generation),
        }
    }

    pub fn on_queue_loaded(&mut self, generation: Generation, result: Result<Page<Listing>, ApiError>) {
        match result {
            Ok(page) => {
                if self.queue.apply(generation, page)
                    && self.queue_state.selected().is_none()
                    && !self.queue.is_empty()
                {
                    self.queue_state.select(Some(0));
                }
            }
            Err(_) => self.queue.fail(generation),
        }
    }

    pub fn on_user_status_changed(&mut self, user_id: UserId, user: User) -> Vec<MarketRequest> {
        info!(user_id = %user_id, status = %user.status(), "User status changed");
        let message = format!("{} is now {}", user.display_name(), user.status());
        self.users.replace_item(user);
        vec![MarketRequest::info("Admin", message)]
    }

    pub fn on_listing_moderated(
        &mut self,
        listing_id: ListingId,
        decision: &ModerationDecision,
    ) -> Vec<MarketRequest> {
        info!(listing_id = %listing_id, decision = decision.label(), "Listing moderated");
        let title = self
            .remove_from_queue(listing_id)
            .map_or_else(|| format!("Listing {listing_id}"), |l| l.title().to_string());
        vec![MarketRequest::info(
            "Moderation",
            format!("\"{title}\" {}", decision.label()),
        )]
    }

    /// Pushed listing change; anything no longer pending leaves the queue.
    pub fn on_listing_updated(&mut self, listing: Listing) {
        if listing.status() == ListingStatus::Pending {
            self.queue.replace_item(listing);
        } else {
            self.remove_from_queue(listing.id());
        }
    }

    fn remove_from_queue(&mut self, id: ListingId) -> Option<Listing> {
        let removed = self.queue.remove_item(id)?;
        if let Some(stats) = self.stats.as_mut() {
            stats.pending_listings = stats.pending_listings.saturating_sub(1);
        }
        let len = self.queue.len();
        let selected = self
            .queue_state
            .selected()
            .filter(|_| len > 0)
            .map(|i| i.min(len - 1));
        self.queue_state.select(selected);
        Some(removed)
    }

    pub fn render(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let [stats_area, body_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(5)]).areas(area);
        self.render_stats(ctx, stats_area, buf);

        match self.pane {
            AdminPane::Users => self.render_users(ctx, body_area, buf),
            AdminPane::Moderation => {
                let table = ListingTable::new(self.queue.items(), &ctx.theme)
                    .title(format!(" Moderation queue ({}) · Tab: users ", self.queue.len()))
                    .date_format(&ctx.settings.date_format)
                    .show_images_count(ctx.settings.show_images_count)
                    .loading(self.queue.is_loading())
                    .empty_message("Nothing waiting for review");
                StatefulWidget::render(table, body_area, buf, &mut self.queue_state);
            }
        }
    }

    fn render_stats(&self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let theme = &ctx.theme;
        let line = match &self.stats {
            Some(stats) => {
                let item = |label: &'static str, value: String| {
                    vec![
                        Span::styled(format!("{label} "), theme.dimmed_style),
                        Span::styled(value, theme.highlight_style.add_modifier(Modifier::BOLD)),
                        Span::raw("   "),
                    ]
                };
                let spans: Vec<Span<'_>> = [
                    item("Users", stats.total_users.to_string()),
                    item("Active", stats.active_listings.to_string()),
                    item("Pending", stats.pending_listings.to_string()),
                    item("Reports", stats.reports_open.to_string()),
                    item("Revenue", stats.revenue().to_string()),
                ]
                .into_iter()
                .flatten()
                .collect();
                Line::from(spans)
            }
            None => Line::from(Span::styled("Loading stats…", theme.dimmed_style)),
        };
        Paragraph::new(line)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.accent))
                    .title(" Dashboard "),
            )
            .render(area, buf);
    }

    fn render_users(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let theme = &ctx.theme;
        if self.users.is_empty() {
            let message = if self.users.is_loading() {
                "Loading users…"
            } else {
                "No users found"
            };
            render_placeholder(" Users ", message, theme, area, buf);
            return;
        }

        let rows: Vec<Row<'_>> = self
            .users
            .items()
            .iter()
            .map(|user| {
                let status_style = match user.status() {
                    UserStatus::Active => theme.success_style,
                    UserStatus::Banned => theme.error_style,
                    UserStatus::Pending => theme.dimmed_style,
                };
                Row::new(vec![
                    Cell::from(user.display_name()),
                    Cell::from(user.email().to_string()).style(theme.dimmed_style),
                    Cell::from(user.role().to_string()),
                    Cell::from(user.status().to_string()).style(status_style),
                    Cell::from(user.credits().to_string()),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(16),
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(vec!["Name", "Email", "Role", "Status", "Credits"])
                .style(theme.highlight_style.add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent))
                .title(format!(" Users ({}) · Tab: moderation ", self.users.len())),
        )
        .row_highlight_style(theme.selection_style);
        StatefulWidget::render(table, area, buf, &mut self.users_state);
    }
}

impl HasCommands for AdminView {
    fn get_commands(&self, registry: &CommandRegistry) -> Vec<Keybind> {
        let actions: &[(Action, &'static str)] = match self.pane {
            AdminPane::Users => &[
                (Action::SwitchPane, "Queue"),
                (Action::BanUser, "Ban"),
                (Action::UnbanUser, "Unban"),
            ],
            AdminPane::Moderation => &[
                (Action::SwitchPane, "Users"),
                (Action::ApproveListing, "Approve"),
                (Action::RejectListing, "Reject"),
            ],
        };
        actions
            .iter()
            .filter_map(|(action, label)| registry.keybind(*action, *label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{commands, context, context_for, listing, toasts};
    use super::*;
    use crate::domain::entities::UserRole;
    use crate::domain::notification::ToastLevel;

    fn loaded(ctx: &MarketContext) -> AdminView {
        let mut view = AdminView::new(&ctx.settings);
        let requests = view.on_activate();
        let cmds = commands(&requests);
        let (
            Some(BackendCommand::LoadAdminUsers { generation: users, .. }),
            Some(BackendCommand::LoadModerationQueue { generation: queue, .. }),
        ) = (cmds.first(), cmds.get(1))
        else {
            panic!("expected admin loads");
        };
        let (users, queue) = (*users, *queue);
        view.set_stats(DashboardStats {
            pending_listings: 2,
            ..DashboardStats::default()
        });
        view.on_users_loaded(
            users,
            Ok(Page::new(
                vec![
                    User::new(1_u64, "Me", "me@example.com").with_role(UserRole::Admin),
                    User::new(2_u64, "Spammer", "spam@example.com"),
                ],
                1,
                20,
                None,
            )),
        );
        view.on_queue_loaded(
            queue,
            Ok(Page::new(
                vec![
                    listing(10, 2).with_status(ListingStatus::Pending),
                    listing(11, 2).with_status(ListingStatus::Pending),
                ],
                1,
                20,
                None,
            )),
        );
        view
    }

    #[test]
    fn test_ban_requires_admin_and_not_self() {
        let ctx = context();
        let mut view = loaded(&ctx);

        let own = view.handle_action(Action::BanUser, &ctx);
        assert_eq!(toasts(&own)[0].0, ToastLevel::Warn);

        view.handle_action(Action::NavigateDown, &ctx);
        let requests = view.handle_action(Action::BanUser, &ctx);
        assert!(matches!(
            commands(&requests)[..],
            [BackendCommand::SetUserStatus { user_id: UserId(2), status: UserStatus::Banned }]
        ));

        let moderator = context_for(User::new(5_u64, "Mod", "mod@example.com").with_role(UserRole::Moderator));
        let refused = view.handle_action(Action::BanUser, &moderator);
        assert!(commands(&refused).is_empty());
    }

    #[test]
    fn test_reject_uses_fixed_reason_and_clears_queue() {
        let ctx = context();
        let mut view = loaded(&ctx);
        view.handle_action(Action::SwitchPane, &ctx);
        assert_eq!(view.pane(), AdminPane::Moderation);

        let requests = view.handle_action(Action::RejectListing, &ctx);
        let Some(BackendCommand::ModerateListing { listing_id, decision }) =
            commands(&requests).first().copied()
        else {
            panic!("expected moderation");
        };
        assert_eq!(*decision, ModerationDecision::reject("Rejected by moderator"));

        view.on_listing_moderated(*listing_id, decision);
        assert_eq!(view.queue().len(), 1);
        assert_eq!(view.stats().map(|s| s.pending_listings), Some(1));
    }

    #[test]
    fn test_pushed_approval_leaves_queue() {
        let ctx = context();
        let mut view = loaded(&ctx);
        view.on_listing_updated(listing(11, 2).with_status(ListingStatus::Active));
        assert_eq!(view.queue().len(), 1);
        assert_eq!(view.queue()[0].id(), ListingId(10));
    }

    #[test]
    fn test_ban_key_ignored_in_moderation_pane() {
        let ctx = context();
        let mut view = loaded(&ctx);
        view.handle_action(Action::SwitchPane, &ctx);
        assert!(view.handle_action(Action::BanUser, &ctx).is_empty());
    }
}
