use crate::domain::keybinding::Keybind;
use crate::presentation::theme::{Theme, adapter};
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

pub struct FooterBarStyle {
    pub background: Style,
    pub label_style: Style,
    pub key_style: Style,
    pub info: Style,
    pub focus_indicator: Style,
}

impl FooterBarStyle {
    #[must_use]
    pub fn from_theme(theme: &Theme) -> Self {
        let accent = theme.accent;
        let key_bg = adapter::tint(accent, Some(0.5), 0.08);

        Self {
            label_style: Style::default()
                .bg(accent)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            key_style: Style::default().bg(key_bg).fg(Color::White),
            focus_indicator: Style::default()
                .bg(key_bg)
                .fg(accent)
                .add_modifier(Modifier::BOLD),
            ..Self::default()
        }
    }
}

impl Default for FooterBarStyle {
    fn default() -> Self {
        Self {
            background: Style::default(),
            label_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            key_style: Style::default().fg(Color::White).bg(Color::DarkGray),
            info: Style::default().fg(Color::DarkGray),
            focus_indicator: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        }
    }
}

pub struct FooterBar<'a> {
    keybindings: &'a [Keybind],
    context_label: Option<&'a str>,
    right_info: Option<&'a str>,
    style: FooterBarStyle,
}

impl<'a> FooterBar<'a> {
    #[must_use]
    pub fn new(keybindings: &'a [Keybind]) -> Self {
        Self {
            keybindings,
            context_label: None,
            right_info: None,
            style: FooterBarStyle::default(),
        }
    }

    /// Label shown before the hints, such as the active pane.
    #[must_use]
    pub const fn context_label(mut self, label: &'a str) -> Self {
        self.context_label = Some(label);
        self
    }

    #[must_use]
    pub const fn right_info(mut self, info: Option<&'a str>) -> Self {
        self.right_info = info;
        self
    }

    #[must_use]
    pub const fn style(mut self, style: FooterBarStyle) -> Self {
        self.style = style;
        self
    }

    fn format_key(key: &crossterm::event::KeyEvent) -> String {
        use std::fmt::Write;
        let mut s = String::new();
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("C-");
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("A-");
        }
        if key.modifiers.contains(KeyModifiers::SHIFT) && !matches!(key.code, KeyCode::Char(_)) {
            s.push_str("S-");
        }

        match key.code {
            KeyCode::Char(' ') => s.push_str("Space"),
            KeyCode::Char(c) => s.push(c),
            KeyCode::Enter => s.push_str("Enter"),
            KeyCode::Esc => s.push_str("Esc"),
            KeyCode::Tab => s.push_str("Tab"),
            KeyCode::BackTab => s.push_str("S-Tab"),
            KeyCode::PageUp => s.push_str("PgUp"),
            KeyCode::PageDown => s.push_str("PgDn"),
            KeyCode::Backspace => s.push_str("Bksp"),
            KeyCode::Up => s.push('↑'),
            KeyCode::Down => s.push('↓'),
            KeyCode::Left => s.push('←'),
            KeyCode::Right => s.push('→'),
            KeyCode::F(n) => {
                let _ = write!(s, "F{n}");
            }
            _ => {
                let _ = write!(s, "{:?}", key.code);
            }
        }
        s
    }

    fn build_left_spans(&self) -> Vec<Span<'_>> {
        let mut spans = Vec::new();

        if let Some(label) = self.context_label {
            spans.push(Span::styled(
                format!(" {} ", label.to_uppercase()),
                self.style.focus_indicator,
            ));
            spans.push(Span::raw(" "));
        }

        for (i, binding) in self
            .keybindings
            .iter()
            .filter(|k| k.visible_in_bar)
            .enumerate()
        {
            if i > 0 {
                spans.push(Span::raw(" "));
            }

            spans.push(Span::styled(
                format!(" {} ", binding.label),
                self.style.label_style,
            ));

            let key_text = binding
                .key_display
                .as_deref()
                .map_or_else(|| Self::format_key(&binding.key), ToString::to_string);

            spans.push(Span::styled(format!(" {key_text} "), self.style.key_style));
        }

        spans
    }
}

impl Widget for FooterBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        for x in area.left()..area.right() {
            buf[(x, area.y)]
                .set_char(' ')
                .set_style(self.style.background);
        }

        let left_spans = self.build_left_spans();
        let left_line = Line::from(left_spans);
        let left_para = Paragraph::new(left_line);
        let right_width = self
            .right_info
            .map_or(0, |s| u16::try_from(s.width()).unwrap_or(u16::MAX));
        let left_width = area.width.saturating_sub(right_width + 1);

        let left_area = Rect::new(area.x, area.y, left_width, 1);
        left_para.render(left_area, buf);

        if let Some(info) = self.right_info {
            let right_spans = vec![Span::styled(info, self.style.info)];
            let right_line = Line::from(right_spans);

            if right_width < area.width {
                let right_x = area.right().saturating_sub(right_width);
                let right_area = Rect::new(right_x, area.y, right_width, 1);
                let right_para = Paragraph::new(right_line);
                right_para.render(right_area, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keybinding::Action;
    use crossterm::event::KeyEvent;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn test_format_key() {
        let key = |code, modifiers| FooterBar::format_key(&KeyEvent::new(code, modifiers));
        assert_eq!(key(KeyCode::Char('l'), KeyModifiers::CONTROL), "C-l");
        assert_eq!(key(KeyCode::Char('A'), KeyModifiers::SHIFT), "A");
        assert_eq!(key(KeyCode::Enter, KeyModifiers::ALT), "A-Enter");
        assert_eq!(key(KeyCode::BackTab, KeyModifiers::NONE), "S-Tab");
        assert_eq!(key(KeyCode::Down, KeyModifiers::NONE), "↓");
        assert_eq!(key(KeyCode::Char(' '), KeyModifiers::NONE), "Space");
        assert_eq!(key(KeyCode::Char(' '), KeyModifiers::CONTROL), "C-Space");
    }

    #[test]
    fn test_style_from_theme_darkens_accent_for_keys() {
        let theme = Theme::new("#FFA500", crate::infrastructure::config::ThemeMode::Dark);
        let style = FooterBarStyle::from_theme(&theme);
        assert_eq!(style.label_style.bg, Some(theme.accent));
        assert_eq!(style.focus_indicator.fg, Some(theme.accent));
        let Some(Color::Rgb(r, g, b)) = style.key_style.bg else {
            panic!("expected rgb key background");
        };
        assert!(r < 40 && g < 40 && b < 40);
        assert!(r > b);
    }

    #[test]
    fn test_hidden_bindings_are_skipped() {
        let bindings = vec![
            Keybind::new(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::NONE), Action::ToggleFavorite, "Favorite"),
            Keybind::new(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE), Action::Quit, "Quit").hidden(),
        ];
        let backend = TestBackend::new(60, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let footer = FooterBar::new(&bindings)
                    .context_label("browse")
                    .right_info(Some("3 / 40"));
                frame.render_widget(footer, frame.area());
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let line: String = (0..60).map(|x| buffer[(x, 0)].symbol().to_string()).collect();
        assert!(line.starts_with(" BROWSE "));
        assert!(line.contains("Favorite"));
        assert!(!line.contains("Quit"));
        assert!(line.ends_with("3 / 40"));
    }
}
