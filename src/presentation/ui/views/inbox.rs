use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};
use tracing::debug;

use super::{MarketContext, MarketRequest, ViewSettings, at_end, render_placeholder, step};
use crate::domain::entities::{InboxNotification, NotificationId};
use crate::domain::errors::ApiError;
use crate::domain::keybinding::{Action, Keybind};
use crate::domain::pagination::{Generation, Page, PageRequest, PagedList};
use crate::presentation::commands::{CommandRegistry, HasCommands};
use crate::presentation::ui::backend::BackendCommand;
use crate::presentation::ui::utils::format_age;

/// Server-side notifications. Reading marks them read optimistically.
pub struct InboxView {
    items: PagedList<InboxNotification>,
    list_state: ListState,
}

impl InboxView {
    #[must_use]
    pub fn new(settings: &ViewSettings) -> Self {
        Self {
            items: PagedList::new(settings.page_size),
            list_state: ListState::default(),
        }
    }

    #[must_use]
    pub fn notifications(&self) -> &[InboxNotification] {
        self.items.items()
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.items.items().iter().filter(|n| !n.is_read()).count()
    }

    /// Starts the first page request made together with the rest of the initial data.
    pub fn begin_initial(&mut self) -> (Generation, PageRequest) {
        self.items.begin_reset()
    }

    pub fn fail_initial(&mut self) {
        self.items.fail(self.items.generation());
    }

    pub fn reload(&mut self) -> Vec<MarketRequest> {
        let (generation, page) = self.items.begin_reset();
        vec![MarketRequest::Command(BackendCommand::LoadNotifications { generation, page })]
    }

    fn load_more(&mut self) -> Vec<MarketRequest> {
        self.items
            .begin_next()
            .map(|(generation, page)| {
                vec![MarketRequest::Command(BackendCommand::LoadNotifications { generation, page })]
            })
            .unwrap_or_default()
    }

    fn selected_id(&self) -> Option<NotificationId> {
        self.list_state
            .selected()
            .and_then(|i| self.items.items().get(i))
            .map(InboxNotification::id)
    }

    pub fn handle_action(&mut self, action: Action) -> Vec<MarketRequest> {
        match action {
            Action::NavigateDown => {
                let len = self.items.len();
                self.list_state.select(step(self.list_state.selected(), len, 1));
                if at_end(self.list_state.selected(), len) {
                    return self.load_more();
                }
                Vec::new()
            }
            Action::NavigateUp => {
                self.list_state
                    .select(step(self.list_state.selected(), self.items.len(), -1));
                Vec::new()
            }
            Action::LoadMore => self.load_more(),
            Action::Select => {
                let Some(id) = self.selected_id() else {
                    return Vec::new();
                };
                match self.items.get_mut(id) {
                    Some(notification) if !notification.is_read() => {
                        notification.mark_read();
                        vec![MarketRequest::Command(BackendCommand::MarkNotificationRead(id))]
                    }
                    _ => Vec::new(),
                }
            }
            Action::MarkAllRead => {
                if self.unread_count() == 0 {
                    return vec![MarketRequest::info("Inbox", "Everything is already read")];
                }
                let ids: Vec<_> = self.items.items().iter().map(InboxNotification::id).collect();
                for id in ids {
                    if let Some(notification) = self.items.get_mut(id) {
                        notification.mark_read();
                    }
                }
                vec![MarketRequest::Command(BackendCommand::MarkAllNotificationsRead)]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_notifications_loaded(
        &mut self,
        generation: Generation,
        result: Result<Page<InboxNotification>, ApiError>,
    ) {
        match result {
            Ok(page) => {
                if self.items.apply(generation, page)
                    && self.list_state.selected().is_none()
                    && !self.items.is_empty()
                {
                    self.list_state.select(Some(0));
                }
            }
            Err(_) => self.items.fail(generation),
        }
    }

    /// A failed mark-read leaves local state wrong, so the list is refetched.
    pub fn on_marked_read(
        &mut self,
        id: Option<NotificationId>,
        result: &Result<(), ApiError>,
    ) -> Vec<MarketRequest> {
        match result {
            Ok(()) => Vec::new(),
            Err(e) => {
                debug!(notification_id = ?id, error = %e, "Mark read failed, reloading inbox");
                self.reload()
            }
        }
    }

    pub fn on_notification_created(
        &mut self,
        notification: InboxNotification,
    ) -> Vec<MarketRequest> {
        let title = notification.title().to_string();
        let body = notification.body().to_string();
        if !self.items.push_front(notification) {
            return Vec::new();
        }
        if let Some(selected) = self.list_state.selected() {
            self.list_state.select(Some(selected + 1));
        }
        vec![MarketRequest::DesktopNotify { title, body }]
    }

    pub fn render(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let theme = &ctx.theme;
        if self.items.is_empty() {
            let message = if self.items.is_loading() {
                "Loading notifications…"
            } else {
                "Your inbox is empty"
            };
            render_placeholder(" Inbox ", message, theme, area, buf);
            return;
        }

        let now = Utc::now();
        let items: Vec<ListItem<'_>> = self
            .items
            .items()
            .iter()
            .map(|n| {
                let (marker, title_style) = if n.is_read() {
                    ("  ", theme.dimmed_style)
                } else {
                    ("● ", theme.highlight_style.add_modifier(Modifier::BOLD))
                };
                let mut lines = vec![Line::from(vec![
                    Span::styled(marker, theme.highlight_style),
                    Span::styled(format!("{} ", n.kind().icon()), theme.base_style),
                    Span::styled(n.title().to_string(), title_style),
                    Span::styled(
                        format!("  {}", format_age(n.created_at(), now, &ctx.settings.date_format)),
                        theme.dimmed_style,
                    ),
                ])];
                if !n.body().is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", n.body().replace('\n', " ")),
                        theme.dimmed_style,
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.accent))
                    .title(format!(" Inbox ({} unread) ", self.unread_count())),
            )
            .highlight_style(theme.selection_style);
        StatefulWidget::render(list, area, buf, &mut self.list_state);
    }
}

impl HasCommands for InboxView {
    fn get_commands(&self, registry: &CommandRegistry) -> Vec<Keybind> {
        [
            (Action::Select, "Mark read"),
            (Action::MarkAllRead, "All read"),
            (Action::LoadMore, "More"),
        ]
        .into_iter()
        .filter_map(|(action, label)| registry.keybind(action, label))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::commands;
    use super::*;
    use crate::domain::entities::InboxKind;

    fn notification(id: u64) -> InboxNotification {
        InboxNotification::new(id, InboxKind::Message, format!("Note {id}"), Utc::now())
            .with_body("body")
    }

    fn loaded(ids: &[u64]) -> InboxView {
        let mut view = InboxView::new(&ViewSettings::default());
        let (generation, _) = view.begin_initial();
        let items = ids.iter().map(|id| notification(*id)).collect();
        view.on_notifications_loaded(generation, Ok(Page::new(items, 1, 20, None)));
        view
    }

    #[test]
    fn test_select_marks_read_once() {
        let mut view = loaded(&[1, 2]);
        assert_eq!(view.unread_count(), 2);

        let requests = view.handle_action(Action::Select);
        assert!(matches!(
            commands(&requests)[..],
            [BackendCommand::MarkNotificationRead(NotificationId(1))]
        ));
        assert_eq!(view.unread_count(), 1);
        assert!(view.handle_action(Action::Select).is_empty());
    }

    #[test]
    fn test_mark_all_read() {
        let mut view = loaded(&[1, 2, 3]);
        let requests = view.handle_action(Action::MarkAllRead);
        assert!(matches!(
            commands(&requests)[..],
            [BackendCommand::MarkAllNotificationsRead]
        ));
        assert_eq!(view.unread_count(), 0);

        let again = view.handle_action(Action::MarkAllRead);
        assert!(matches!(again.first(), Some(MarketRequest::Toast { .. })));
    }

    #[test]
    fn test_failed_mark_read_reloads() {
        let mut view = loaded(&[1]);
        view.handle_action(Action::Select);
        let requests = view.on_marked_read(Some(NotificationId(1)), &Err(ApiError::network("down")));
        assert!(matches!(
            commands(&requests)[..],
            [BackendCommand::LoadNotifications { .. }]
        ));
    }

    #[test]
    fn test_pushed_notification_goes_first_and_notifies() {
        let mut view = loaded(&[1]);
        let requests = view.on_notification_created(notification(9));

        assert_eq!(view.notifications()[0].id(), NotificationId(9));
        assert_eq!(view.list_state.selected(), Some(1));
        assert!(matches!(requests.first(), Some(MarketRequest::DesktopNotify { .. })));

        assert!(view.on_notification_created(notification(9)).is_empty());
    }
}
