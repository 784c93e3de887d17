use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};
use tracing::debug;

use super::{MarketContext, MarketRequest, render_placeholder, step};
use crate::application::services::{MessageThread, ThreadEntry};
use crate::domain::entities::{ChatMessage, Conversation, ConversationId, UserId};
use crate::domain::errors::ApiError;
use crate::domain::keybinding::{Action, Keybind};
use crate::domain::pagination::{Page, PageRequest};
use crate::presentation::commands::{CommandRegistry, HasCommands};
use crate::presentation::theme::Theme;
use crate::presentation::ui::backend::BackendCommand;
use crate::presentation::ui::utils::{format_age, format_time, hash_id_to_color, wrap_text};
use crate::presentation::widgets::TextInput;

const LIST_WIDTH_PERCENT: u16 = 35;
const PREVIEW_CHARS: usize = 60;

/// Conversation list on the left, the open thread and composer on the right.
pub struct MessagesView {
    conversations: Vec<Conversation>,
    list_state: ListState,
    thread: Option<MessageThread>,
    /// Lines scrolled up from the newest message.
    scroll: usize,
    composer: TextInput,
    composing: bool,
}

impl MessagesView {
    #[must_use]
    pub fn new(theme: &Theme) -> Self {
        Self {
            conversations: Vec::new(),
            list_state: ListState::default(),
            thread: None,
            scroll: 0,
            composer: TextInput::new(" Message ")
                .placeholder("Type a message, Enter to send")
                .accent(theme.accent),
            composing: false,
        }
    }

    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    #[must_use]
    pub const fn thread(&self) -> Option<&MessageThread> {
        self.thread.as_ref()
    }

    #[must_use]
    pub const fn is_composing(&self) -> bool {
        self.composing
    }

    #[must_use]
    pub fn unread_total(&self) -> u32 {
        self.conversations.iter().map(Conversation::unread_count).sum()
    }

    fn open_id(&self) -> Option<ConversationId> {
        self.thread.as_ref().map(MessageThread::conversation_id)
    }

    fn selected_id(&self) -> Option<ConversationId> {
        self.list_state
            .selected()
            .and_then(|i| self.conversations.get(i))
            .map(Conversation::id)
    }

    /// Keeps the list ordered by last activity and the selection on the same row.
    fn sort(&mut self) {
        let selected = self.selected_id();
        self.conversations
            .sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        let index = selected
            .and_then(|id| self.conversations.iter().position(|c| c.id() == id))
            .or_else(|| (!self.conversations.is_empty()).then_some(0));
        self.list_state.select(index);
    }

    pub fn set_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
        if let Some(open) = self.open_id()
            && let Some(conversation) = self.conversations.iter_mut().find(|c| c.id() == open)
        {
            conversation.mark_read();
        }
        self.sort();
    }

    fn open(&mut self, id: ConversationId, ctx: &MarketContext) -> Vec<MarketRequest> {
        let per_page = ctx.settings.page_size;
        self.thread = Some(MessageThread::new(id, ctx.user.id(), per_page));
        self.scroll = 0;

        let mut requests = vec![MarketRequest::Command(BackendCommand::LoadMessages {
            conversation_id: id,
            page: PageRequest::first(per_page),
        })];
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id() == id)
            && conversation.unread_count() > 0
        {
            conversation.mark_read();
            requests.push(MarketRequest::Command(BackendCommand::MarkConversationRead(id)));
        }
        debug!(conversation_id = %id, "Opened conversation");
        requests
    }

    fn close(&mut self) {
        self.thread = None;
        self.composing = false;
        self.composer.set_focused(false);
        self.scroll = 0;
    }

    fn start_composing(&mut self) {
        self.composing = true;
        self.composer.set_focused(true);
    }

    pub fn handle_action(&mut self, action: Action, ctx: &mut MarketContext) -> Vec<MarketRequest> {
        match action {
            Action::NavigateDown if self.thread.is_some() => {
                self.scroll = self.scroll.saturating_sub(1);
                Vec::new()
            }
            Action::NavigateUp if self.thread.is_some() => {
                self.scroll = self.scroll.saturating_add(1);
                Vec::new()
            }
            Action::NavigateDown | Action::NavigateUp => {
                let delta = if action == Action::NavigateDown { 1 } else { -1 };
                self.list_state
                    .select(step(self.list_state.selected(), self.conversations.len(), delta));
                Vec::new()
            }
            Action::Select => match (self.open_id(), self.selected_id()) {
                (Some(_), _) => {
                    self.start_composing();
                    Vec::new()
                }
                (None, Some(id)) => self.open(id, ctx),
                (None, None) => Vec::new(),
            },
            Action::Compose => {
                let mut requests = Vec::new();
                if self.thread.is_none() {
                    let Some(id) = self.selected_id() else {
                        return Vec::new();
                    };
                    requests = self.open(id, ctx);
                }
                self.start_composing();
                requests
            }
            Action::Cancel => {
                self.close();
                Vec::new()
            }
            Action::LoadMore => {
                let Some(thread) = &self.thread else {
                    return Vec::new();
                };
                match thread.older_request() {
                    Some(page) => vec![MarketRequest::Command(BackendCommand::LoadMessages {
                        conversation_id: thread.conversation_id(),
                        page,
                    })],
                    None => vec![MarketRequest::info("Messages", "No older messages")],
                }
            }
            Action::RetryMessage => self.retry(),
            _ => Vec::new(),
        }
    }

    /// Keys while the composer has focus.
    pub fn handle_input_key(&mut self, key: KeyEvent) -> Vec<MarketRequest> {
        match key.code {
            KeyCode::Esc => {
                self.composing = false;
                self.composer.set_focused(false);
                Vec::new()
            }
            KeyCode::Enter if !key.modifiers.contains(KeyModifiers::ALT) => self.send(),
            _ => {
                self.composer.handle_key(key);
                Vec::new()
            }
        }
    }

    fn send(&mut self) -> Vec<MarketRequest> {
        let Some(thread) = self.thread.as_mut() else {
            return Vec::new();
        };
        match thread.begin_send(self.composer.value()) {
            Ok(pending) => {
                self.composer.clear();
                self.scroll = 0;
                vec![MarketRequest::Command(BackendCommand::SendMessage {
                    conversation_id: thread.conversation_id(),
                    body: pending.body,
                    nonce: pending.nonce,
                })]
            }
            Err(e) => vec![MarketRequest::warn("Messages", e.user_message())],
        }
    }

    fn retry(&mut self) -> Vec<MarketRequest> {
        let Some(thread) = self.thread.as_mut() else {
            return Vec::new();
        };
        let Some(nonce) = thread.last_failed().map(|p| p.nonce.clone()) else {
            return vec![MarketRequest::info("Messages", "Nothing to retry")];
        };
        match thread.retry(&nonce) {
            Some(body) => vec![MarketRequest::Command(BackendCommand::SendMessage {
                conversation_id: thread.conversation_id(),
                body,
                nonce,
            })],
            None => Vec::new(),
        }
    }

    pub fn on_messages_loaded(&mut self, conversation_id: ConversationId, page: Page<ChatMessage>) {
        if let Some(thread) = self.thread.as_mut()
            && thread.conversation_id() == conversation_id
        {
            thread.prepend_history(page);
        }
    }

    pub fn on_message_sent(
        &mut self,
        conversation_id: ConversationId,
        nonce: &str,
        result: Result<ChatMessage, ApiError>,
        me: UserId,
    ) {
        let thread = self
            .thread
            .as_mut()
            .filter(|t| t.conversation_id() == conversation_id);
        match result {
            Ok(message) => {
                if let Some(conversation) = self
                    .conversations
                    .iter_mut()
                    .find(|c| c.id() == conversation_id)
                {
                    conversation.record_message(message.clone(), me);
                }
                if let Some(thread) = thread {
                    thread.confirm(nonce, message);
                }
                self.sort();
            }
            Err(_) => {
                if let Some(thread) = thread {
                    thread.fail(nonce);
                }
            }
        }
    }

    /// Puts a newly started conversation on top and opens it with the composer.
    pub fn on_conversation_started(
        &mut self,
        conversation: Conversation,
        ctx: &MarketContext,
    ) -> Vec<MarketRequest> {
        let id = conversation.id();
        self.conversations.retain(|c| c.id() != id);
        self.conversations.insert(0, conversation);
        self.list_state.select(Some(0));
        self.sort();
        let requests = self.open(id, ctx);
        self.start_composing();
        requests
    }

    pub fn on_message_created(&mut self, message: ChatMessage, ctx: &MarketContext) -> Vec<MarketRequest> {
        let me = ctx.user.id();
        let conversation_id = message.conversation_id();
        let mine = message.sender_id() == me;
        let viewing = self.open_id() == Some(conversation_id);
        let mut requests = Vec::new();

        let sender = match self
            .conversations
            .iter_mut()
            .find(|c| c.id() == conversation_id)
        {
            Some(conversation) => {
                conversation.record_message(message.clone(), me);
                if viewing {
                    conversation.mark_read();
                }
                conversation.counterpart_label().to_string()
            }
            None => {
                debug!(conversation_id = %conversation_id, "Message for unknown conversation, refetching");
                requests.push(MarketRequest::Command(BackendCommand::LoadConversations));
                String::from("a buyer")
            }
        };

        if !mine {
            if viewing {
                requests.push(MarketRequest::Command(BackendCommand::MarkConversationRead(
                    conversation_id,
                )));
            } else {
                requests.push(MarketRequest::DesktopNotify {
                    title: format!("New message from {sender}"),
                    body: message.body().to_string(),
                });
            }
        }
        if let Some(thread) = self.thread.as_mut() {
            thread.receive(message);
        }
        self.sort();
        requests
    }

    pub fn on_conversation_read(&mut self, id: ConversationId) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id() == id) {
            conversation.mark_read();
        }
    }

    pub fn render(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let [list_area, thread_area] = Layout::horizontal([
            Constraint::Percentage(LIST_WIDTH_PERCENT),
            Constraint::Min(20),
        ])
        .areas(area);

        self.render_list(ctx, list_area, buf);

        let [messages_area, composer_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(thread_area);
        match &self.thread {
            Some(thread) => {
                let title = self
                    .conversations
                    .iter()
                    .find(|c| c.id() == thread.conversation_id())
                    .map_or_else(|| String::from(" Conversation "), thread_title);
                render_thread(thread, &title, self.scroll, ctx, messages_area, buf);
                (&self.composer).render(composer_area, buf);
            }
            None => render_placeholder(
                " Conversation ",
                "Select a conversation and press Enter",
                &ctx.theme,
                thread_area,
                buf,
            ),
        }
    }

    fn render_list(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let theme = &ctx.theme;
        if self.conversations.is_empty() {
            render_placeholder(" Conversations ", "No conversations yet", theme, area, buf);
            return;
        }

        let now = Utc::now();
        let items: Vec<ListItem<'_>> = self
            .conversations
            .iter()
            .map(|conversation| {
                let unread = conversation.unread_count();
                let name_style = if unread > 0 {
                    theme.highlight_style.add_modifier(Modifier::BOLD)
                } else {
                    theme.base_style
                };
                let mut header = vec![Span::styled(
                    conversation.counterpart_label().to_string(),
                    name_style,
                )];
                if unread > 0 {
                    header.push(Span::styled(format!(" ({unread})"), theme.highlight_style));
                }
                header.push(Span::styled(
                    format!(
                        "  {}",
                        format_age(conversation.updated_at(), now, &ctx.settings.date_format)
                    ),
                    theme.dimmed_style,
                ));

                let mut lines = vec![Line::from(header)];
                if let Some(listing) = conversation.listing() {
                    lines.push(Line::from(Span::styled(
                        format!("re: {}", listing.title),
                        theme.dimmed_style.add_modifier(Modifier::ITALIC),
                    )));
                }
                lines.push(Line::from(Span::styled(
                    conversation.preview(PREVIEW_CHARS),
                    theme.dimmed_style,
                )));
                ListItem::new(lines)
            })
            .collect();

        let border_style = if self.thread.is_none() {
            Style::default().fg(theme.accent)
        } else {
            theme.dimmed_style
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!(" Conversations ({}) ", self.conversations.len())),
            )
            .highlight_style(theme.selection_style);
        StatefulWidget::render(list, area, buf, &mut self.list_state);
    }
}

fn thread_title(conversation: &Conversation) -> String {
    match conversation.listing() {
        Some(listing) => format!(" {} · {} ", conversation.counterpart_label(), listing.title),
        None => format!(" {} ", conversation.counterpart_label()),
    }
}

fn render_thread(
    thread: &MessageThread,
    title: &str,
    scroll: usize,
    ctx: &MarketContext,
    area: Rect,
    buf: &mut Buffer,
) {
    let theme = &ctx.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(title.to_string());
    let inner = block.inner(area);
    block.render(area, buf);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if thread.is_empty() {
        Paragraph::new("No messages yet. Press i to write one.")
            .style(theme.dimmed_style)
            .render(inner, buf);
        return;
    }

    let width = usize::from(inner.width);
    let mut lines: Vec<Line<'static>> = Vec::new();
    for entry in thread.entries() {
        let (time, author, author_style, body, status) = match entry {
            ThreadEntry::Delivered(message) => {
                let mine = thread.is_mine(message);
                let (author, style) = if mine {
                    ("You".to_string(), Style::default().fg(theme.accent))
                } else {
                    (
                        "Them".to_string(),
                        Style::default().fg(hash_id_to_color(message.sender_id().as_u64())),
                    )
                };
                (format_time(message.sent_at()), author, style, message.body(), None)
            }
            ThreadEntry::Pending(pending) => {
                let status = if pending.failed {
                    Span::styled(" ✗ failed, press r to retry", theme.error_style)
                } else {
                    Span::styled(" sending…", theme.dimmed_style)
                };
                (
                    format_time(pending.created_at),
                    "You".to_string(),
                    theme.dimmed_style,
                    pending.body.as_str(),
                    Some(status),
                )
            }
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{time} "), theme.dimmed_style),
            Span::styled(author, author_style.add_modifier(Modifier::BOLD)),
        ]));
        let body_style = if status.is_some() {
            theme.dimmed_style
        } else {
            theme.base_style
        };
        let mut wrapped: Vec<Line<'static>> = wrap_text(body, width.saturating_sub(2))
            .into_iter()
            .map(|l| Line::from(Span::styled(format!("  {l}"), body_style)))
            .collect();
        if let (Some(status), Some(last)) = (status, wrapped.last_mut()) {
            last.push_span(status);
        }
        lines.extend(wrapped);
    }

    let height = usize::from(inner.height);
    let max_scroll = lines.len().saturating_sub(height);
    let end = lines.len() - scroll.min(max_scroll);
    let start = end.saturating_sub(height);
    Paragraph::new(lines[start..end].to_vec()).render(inner, buf);
}

impl HasCommands for MessagesView {
    fn get_commands(&self, registry: &CommandRegistry) -> Vec<Keybind> {
        if self.composing {
            let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
            return vec![
                Keybind::new(key(KeyCode::Enter), Action::Select, "Send"),
                Keybind::new(key(KeyCode::Esc), Action::Cancel, "Done"),
            ];
        }
        let actions: &[(Action, &'static str)] = if self.thread.is_some() {
            &[
                (Action::Compose, "Write"),
                (Action::RetryMessage, "Retry"),
                (Action::LoadMore, "Older"),
                (Action::Cancel, "Close"),
            ]
        } else {
            &[(Action::Select, "Open"), (Action::Compose, "Write")]
        };
        actions
            .iter()
            .filter_map(|(action, label)| registry.keybind(*action, *label))
            .collect()
    }
}
