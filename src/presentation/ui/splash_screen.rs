use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Widget},
};

use crate::presentation::theme::Theme;

const LOGO_TEXT: &str = "
 ██████   █████  ███████  █████   █████  ██████
 ██   ██ ██   ██    ███  ██   ██ ██   ██ ██   ██
 ██████  ███████   ███   ███████ ███████ ██████
 ██   ██ ██   ██  ███    ██   ██ ██   ██ ██   ██
 ██████  ██   ██ ███████ ██   ██ ██   ██ ██   ██";

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const FRAME_TIME: Duration = Duration::from_millis(100);

/// Shown between a successful login and the first batch of market data.
pub struct SplashScreen {
    theme: Theme,
    user_label: String,
    elapsed: Duration,
}

impl SplashScreen {
    #[must_use]
    pub fn new(theme: Theme, user_label: impl Into<String>) -> Self {
        Self {
            theme,
            user_label: user_label.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn tick(&mut self, duration: Duration) {
        self.elapsed = self.elapsed.saturating_add(duration);
    }

    fn spinner(&self) -> &'static str {
        let frame = self.elapsed.as_millis() / FRAME_TIME.as_millis();
        let index = usize::try_from(frame).unwrap_or(0) % SPINNER.len();
        SPINNER[index]
    }
}

impl Widget for &SplashScreen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let logo = Text::from(LOGO_TEXT.trim_matches('\n'))
            .style(Style::default().fg(self.theme.accent).add_modifier(Modifier::BOLD))
            .centered();
        let logo_height = u16::try_from(logo.lines.len()).unwrap_or(0);

        let [_, logo_area, _, status_area, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(logo_height),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Fill(1),
        ])
        .areas(area);

        Paragraph::new(logo).render(logo_area, buf);

        let status = vec![
            Line::from(vec![
                Span::styled(format!("{} ", self.spinner()), self.theme.highlight_style),
                Span::styled("Loading marketplace…", self.theme.base_style),
            ])
            .centered(),
            Line::from(Span::styled(
                format!("signed in as {}", self.user_label),
                self.theme.dimmed_style,
            ))
            .centered(),
        ];
        Paragraph::new(status).render(status_area, buf);
    }
}
