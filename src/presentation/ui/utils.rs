use chrono::{DateTime, Local, Utc};
use ratatui::style::Color;
use unicode_width::UnicodeWidthChar;

/// Collapses a message body to one line without control characters.
#[must_use]
pub fn clean_text(s: &str) -> String {
    s.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cuts `s` to at most `max_width` terminal columns, ending with `…` when cut.
#[must_use]
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return s.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Greedy word wrap by terminal width. Words wider than `width` are split.
#[must_use]
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut used = 0;
        for word in paragraph.split_whitespace() {
            let word_width: usize = word.chars().map(|c| c.width().unwrap_or(0)).sum();
            let gap = usize::from(used > 0);
            if used + gap + word_width <= width {
                if gap == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                used += gap + word_width;
                continue;
            }
            if used > 0 {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            for c in word.chars() {
                let w = c.width().unwrap_or(0);
                if used + w > width {
                    lines.push(std::mem::take(&mut line));
                    used = 0;
                }
                line.push(c);
                used += w;
            }
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

const USER_PALETTE: &[Color] = &[
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::LightRed,
    Color::LightGreen,
    Color::LightYellow,
    Color::LightBlue,
    Color::LightMagenta,
    Color::LightCyan,
];

/// Stable color for a participant id.
#[must_use]
pub fn hash_id_to_color(id: u64) -> Color {
    #[allow(clippy::cast_possible_truncation)]
    let index = (id % USER_PALETTE.len() as u64) as usize;
    USER_PALETTE[index]
}

/// Short age such as `now`, `5m`, `3h` or `2d`; older dates use `date_format`.
#[must_use]
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>, date_format: &str) -> String {
    let age = now.signed_duration_since(at);
    if age.num_seconds() < 60 {
        "now".to_string()
    } else if age.num_minutes() < 60 {
        format!("{}m", age.num_minutes())
    } else if age.num_hours() < 24 {
        format!("{}h", age.num_hours())
    } else if age.num_days() < 7 {
        format!("{}d", age.num_days())
    } else {
        at.with_timezone(&Local).format(date_format).to_string()
    }
}

/// Clock time of a chat message in the local timezone.
#[must_use]
pub fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  hello\n\tthere\u{7} "), "hello there");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("a longer title", 8), "a longe…");
        assert_eq!(truncate_to_width("日本語のタイトル", 5), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn test_format_age() {
        let now = Utc::now();
        assert_eq!(format_age(now, now, "%Y-%m-%d"), "now");
        assert_eq!(format_age(now - Duration::minutes(5), now, "%Y-%m-%d"), "5m");
        assert_eq!(format_age(now - Duration::hours(3), now, "%Y-%m-%d"), "3h");
        assert_eq!(format_age(now - Duration::days(2), now, "%Y-%m-%d"), "2d");
        assert_eq!(format_age(now - Duration::days(30), now, "%Y").len(), 4);
    }

    #[test]
    fn test_hash_id_to_color_is_stable() {
        assert_eq!(hash_id_to_color(42), hash_id_to_color(42));
    }
}
