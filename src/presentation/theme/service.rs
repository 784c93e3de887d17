use super::adapter::{hsl_of, tint};
use crate::infrastructure::config::ThemeMode;
use ratatui::style::{Color, Modifier, Style};
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub mode: ThemeMode,
    pub selection_style: Style,
    pub dimmed_style: Style,
    pub base_style: Style,
    /// Unread rows, favorites and other things that need attention.
    pub highlight_style: Style,
    pub price_style: Style,
    pub error_style: Style,
    pub success_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new("Cyan", ThemeMode::Dark)
    }
}

impl Theme {
    pub fn new(accent_color_str: &str, mode: ThemeMode) -> Self {
        Self::from_color(parse_color(accent_color_str), mode)
    }

    #[must_use]
    pub fn from_color(accent: Color, mode: ThemeMode) -> Self {
        let (selection_fg, base_fg, dimmed_fg, selection_l, price_l) = match mode {
            ThemeMode::Dark => (Color::White, Color::Reset, Color::DarkGray, 0.2, 0.7),
            ThemeMode::Light => (Color::Black, Color::Black, Color::Gray, 0.85, 0.3),
        };
        let selection_bg = tint(accent, Some(0.3), selection_l);
        let price = tint(accent, None, price_l);

        Self {
            accent,
            mode,
            selection_style: Style::default().bg(selection_bg).fg(selection_fg),
            dimmed_style: Style::default().fg(dimmed_fg),
            base_style: Style::default().fg(base_fg),
            highlight_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            price_style: Style::default().fg(price),
            error_style: Style::default().fg(Color::Red),
            success_style: Style::default().fg(Color::Green),
        }
    }
}

fn parse_color(s: &str) -> Color {
    if let Ok(c) = Color::from_str(s) {
        return c;
    }

    if s.starts_with('#')
        && let Some((r, g, b)) = parse_hex_color(s)
    {
        return Color::Rgb(r, g, b);
    }

    match s.to_lowercase().as_str() {
        "orange" => Color::Indexed(208),
        _ => Color::Cyan,
    }
}

fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let s = s.trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }

    let channel = |hex: &str| u8::from_str_radix(hex, 16).ok();
    match s.len() {
        6 => Some((channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?)),
        3 => {
            let double = |i: usize| channel(&s[i..=i].repeat(2));
            Some((double(0)?, double(1)?, double(2)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("Red"), Color::Red);
        assert_eq!(parse_color("blue"), Color::Blue);
        assert_eq!(parse_color("#FF0000"), Color::Rgb(255, 0, 0));
        assert_eq!(parse_color("#0f0"), Color::Rgb(0, 255, 0));
        assert_eq!(parse_color("Orange"), Color::Indexed(208));
        assert_eq!(parse_color("#12"), Color::Cyan);
        assert_eq!(parse_color("Invalid"), Color::Cyan);
    }

    #[test]
    fn test_light_mode_uses_light_selection() {
        let dark = Theme::new("#3366cc", ThemeMode::Dark);
        let light = Theme::new("#3366cc", ThemeMode::Light);

        let lightness = |style: Style| match style.bg {
            Some(color) => hsl_of(color).l,
            None => panic!("selection has no background"),
        };
        assert!(lightness(light.selection_style) > lightness(dark.selection_style));
        assert_eq!(light.base_style.fg, Some(Color::Black));
        assert_eq!(dark.accent, light.accent);
    }
}
