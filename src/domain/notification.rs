//! Transient toast messages shown over the UI.

use std::time::{Duration, Instant};

/// Default time a toast stays on screen once displayed.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warn,
    Error,
}

impl ToastLevel {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warn => "Warning",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
    pub displayed_at: Option<Instant>,
    pub duration: Duration,
}

impl Toast {
    #[must_use]
    pub fn new(level: ToastLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            displayed_at: None,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Expiry only starts counting once the toast has been shown.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.displayed_at
            .is_some_and(|start| now.saturating_duration_since(start) > self.duration)
    }

    pub fn mark_displayed(&mut self, now: Instant) {
        if self.displayed_at.is_none() {
            self.displayed_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_defaults() {
        let toast = Toast::new(ToastLevel::Warn, "Search", "Unknown category");
        assert_eq!(toast.duration, DEFAULT_TOAST_DURATION);
        assert_eq!(toast.level.title(), "Warning");
    }

    #[test]
    fn test_not_expired_until_displayed() {
        let start = Instant::now();
        let mut toast = Toast::new(ToastLevel::Info, "t", "m").with_duration(Duration::from_secs(1));
        assert!(!toast.is_expired_at(start + Duration::from_secs(10)));

        toast.mark_displayed(start);
        assert!(!toast.is_expired_at(start + Duration::from_millis(500)));
        assert!(toast.is_expired_at(start + Duration::from_secs(2)));
    }
}
