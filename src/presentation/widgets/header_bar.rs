use crate::domain::ConnectionStatus;
use crate::presentation::theme::{Theme, adapter};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

trait ConnectionStatusExt {
    fn display_text(self) -> &'static str;
    fn indicator(self) -> &'static str;
}

impl ConnectionStatusExt for ConnectionStatus {
    fn display_text(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "LIVE",
            Self::Reconnecting => "RECONNECTING",
            Self::Offline => "OFFLINE",
            Self::Error => "ERROR",
        }
    }

    fn indicator(self) -> &'static str {
        match self {
            Self::Connected => "●",
            Self::Connecting | Self::Reconnecting => "◐",
            Self::Disconnected | Self::Offline | Self::Error => "○",
        }
    }
}

pub struct HeaderBarStyle {
    pub background: Style,
    pub app_name: Style,
    pub version: Style,
    pub tab: Style,
    pub tab_selected: Style,
    pub credits: Style,
    pub status_connected: Style,
    pub status_disconnected: Style,
    pub status_connecting: Style,
    pub status_offline: Style,
    pub status_error: Style,
}

impl HeaderBarStyle {
    #[must_use]
    pub fn from_theme(theme: &Theme) -> Self {
        let accent = theme.accent;
        let version_bg = adapter::tint(accent, Some(0.5), 0.08);

        Self {
            app_name: Style::default()
                .bg(accent)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            version: Style::default().bg(version_bg).fg(Color::White),
            tab: theme.dimmed_style,
            tab_selected: Style::default()
                .fg(accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            credits: Style::default().bg(version_bg).fg(accent),
            status_connected: Style::default()
                .bg(Color::Green)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            status_disconnected: Style::default()
                .bg(Color::Red)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            status_connecting: Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            status_offline: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_error: Style::default()
                .bg(Color::Red)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            ..Self::default()
        }
    }
}

impl Default for HeaderBarStyle {
    fn default() -> Self {
        Self {
            background: Style::default(),
            app_name: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            version: Style::default().fg(Color::DarkGray),
            tab: Style::default().fg(Color::DarkGray),
            tab_selected: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            credits: Style::default().fg(Color::Cyan),
            status_connected: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            status_disconnected: Style::default().fg(Color::Red),
            status_connecting: Style::default().fg(Color::Yellow),
            status_offline: Style::default().fg(Color::DarkGray),
            status_error: Style::default().fg(Color::Red),
        }
    }
}

/// Top bar: app name and version, the tab strip, then credits and the
/// realtime indicator on the right.
pub struct HeaderBar<'a> {
    app_name: &'a str,
    version: &'a str,
    tabs: &'a [&'a str],
    selected_tab: Option<usize>,
    credits: Option<i64>,
    connection_status: ConnectionStatus,
    style: HeaderBarStyle,
}

impl<'a> HeaderBar<'a> {
    #[must_use]
    pub fn new(app_name: &'a str, version: &'a str) -> Self {
        Self {
            app_name,
            version,
            tabs: &[],
            selected_tab: None,
            credits: None,
            connection_status: ConnectionStatus::default(),
            style: HeaderBarStyle::default(),
        }
    }

    #[must_use]
    pub const fn tabs(mut self, tabs: &'a [&'a str], selected: usize) -> Self {
        self.tabs = tabs;
        self.selected_tab = Some(selected);
        self
    }

    #[must_use]
    pub const fn credits(mut self, credits: Option<i64>) -> Self {
        self.credits = credits;
        self
    }

    #[must_use]
    pub const fn connection_status(mut self, status: ConnectionStatus) -> Self {
        self.connection_status = status;
        self
    }

    #[must_use]
    pub const fn style(mut self, style: HeaderBarStyle) -> Self {
        self.style = style;
        self
    }

    const fn status_style(&self) -> Style {
        match self.connection_status {
            ConnectionStatus::Connected => self.style.status_connected,
            ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => {
                self.style.status_connecting
            }
            ConnectionStatus::Disconnected => self.style.status_disconnected,
            ConnectionStatus::Offline => self.style.status_offline,
            ConnectionStatus::Error => self.style.status_error,
        }
    }

    fn build_right_spans(&self) -> (Vec<Span<'static>>, u16) {
        let mut spans = Vec::new();

        if let Some(credits) = self.credits {
            spans.push(Span::styled(format!(" ◆ {credits} "), self.style.credits));
            spans.push(Span::raw(" "));
        }

        let status = format!(
            " {} {} ",
            self.connection_status.indicator(),
            self.connection_status.display_text()
        );
        spans.push(Span::styled(status, self.status_style()));

        let width: usize = spans.iter().map(|s| s.content.width()).sum();
        (spans, u16::try_from(width).unwrap_or(u16::MAX))
    }

    fn build_tab_spans(&self) -> Vec<Span<'a>> {
        let mut spans = Vec::new();
        for (i, tab) in self.tabs.iter().enumerate() {
            let style = if Some(i) == self.selected_tab {
                self.style.tab_selected
            } else {
                self.style.tab
            };
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("{}:{tab}", i + 1), style));
        }
        spans
    }
}

impl Widget for HeaderBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        for x in area.left()..area.right() {
            buf[(x, area.y)]
                .set_char(' ')
                .set_style(self.style.background);
        }

        let mut left_spans = vec![
            Span::styled(
                format!(" {} ", self.app_name.to_uppercase()),
                self.style.app_name,
            ),
            Span::raw(" "),
            Span::styled(format!(" v{} ", self.version), self.style.version),
        ];
        left_spans.extend(self.build_tab_spans());

        let left_line = Line::from(left_spans);
        let left_width = u16::try_from(left_line.width()).unwrap_or(u16::MAX);

        let (right_spans, right_width) = self.build_right_spans();
        let right_fits = right_width < area.width.saturating_sub(left_width);

        let left_limit = if right_fits {
            area.width.saturating_sub(right_width)
        } else {
            area.width
        };
        let left_area = Rect::new(area.x, area.y, left_width.min(left_limit), 1);
        Paragraph::new(left_line).render(left_area, buf);

        if right_fits {
            let right_x = area.right().saturating_sub(right_width);
            let right_area = Rect::new(right_x, area.y, right_width, 1);
            Paragraph::new(Line::from(right_spans)).render(right_area, buf);
        }
    }
}
