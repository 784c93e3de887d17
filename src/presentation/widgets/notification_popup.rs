use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::domain::notification::{Toast, ToastLevel};
use crate::presentation::theme::Theme;

/// Toast box anchored to the top-right corner.
pub struct NotificationPopup<'a> {
    toast: &'a Toast,
    theme: &'a Theme,
}

impl<'a> NotificationPopup<'a> {
    #[must_use]
    pub const fn new(toast: &'a Toast, theme: &'a Theme) -> Self {
        Self { toast, theme }
    }
}

impl Widget for NotificationPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(" {} ", self.toast.title);
        let message = &self.toast.message;

        let max_popup_width = 60.min(area.width.saturating_sub(2));
        let width = u16::try_from(message.width())
            .unwrap_or(u16::MAX)
            .max(u16::try_from(title.width()).unwrap_or(0))
            .saturating_add(4)
            .min(max_popup_width);

        let inner_width = width.saturating_sub(2).max(1);
        let content_width = u16::try_from(message.width()).unwrap_or(0);
        let lines = content_width.div_ceil(inner_width);
        let height = lines.saturating_add(2).clamp(3, 10);

        let x = area.x + area.width.saturating_sub(width).saturating_sub(2);
        let y = area.y + 2;
        let popup_area = Rect::new(x, y, width, height);

        let intersection = area.intersection(popup_area);
        if intersection.area() == 0 {
            return;
        }

        let color = match self.toast.level {
            ToastLevel::Info => self.theme.accent,
            ToastLevel::Warn => Color::Yellow,
            ToastLevel::Error => Color::Red,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(color));

        let para = Paragraph::new(message.as_str())
            .block(block)
            .wrap(Wrap { trim: true })
            .style(Style::default().add_modifier(Modifier::BOLD));

        Clear.render(intersection, buf);
        para.render(intersection, buf);
    }
}
