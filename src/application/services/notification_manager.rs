use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::domain::notification::{DEFAULT_TOAST_DURATION, Toast, ToastLevel};

/// FIFO of toasts; only the front one is shown and its timer runs once displayed.
#[derive(Debug)]
pub struct NotificationManager {
    queue: VecDeque<Toast>,
    default_duration: Duration,
    enabled: bool,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl NotificationManager {
    #[must_use]
    pub fn new(default_duration: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            default_duration,
            enabled: true,
        }
    }

    /// Disabled managers drop info and warning toasts; errors are always queued.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn notify(&mut self, level: ToastLevel, title: impl Into<String>, message: impl Into<String>) {
        if !self.enabled && level != ToastLevel::Error {
            return;
        }
        let toast = Toast::new(level, title, message).with_duration(self.default_duration);
        self.queue.push_back(toast);
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notify(ToastLevel::Info, title, message);
    }

    pub fn warn(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notify(ToastLevel::Warn, title, message);
    }

    pub fn error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notify(ToastLevel::Error, title, message);
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        if let Some(front) = self.queue.front_mut() {
            front.mark_displayed(now);
            if front.is_expired_at(now) {
                self.queue.pop_front();
                if let Some(next) = self.queue.front_mut() {
                    next.mark_displayed(now);
                }
            }
        }
    }

    #[must_use]
    pub fn current_notification(&self) -> Option<&Toast> {
        self.queue.front()
    }

    #[must_use]
    pub fn has_notifications(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn dismiss(&mut self) {
        self.queue.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_flow() {
        let mut manager = NotificationManager::default();

        manager.info("Favorites", "Saved");
        assert!(manager.current_notification().is_some());

        manager.tick();
        assert!(manager.current_notification().is_some());
    }

    #[test]
    fn test_queueing() {
        let start = Instant::now();
        let mut manager = NotificationManager::new(Duration::from_secs(2));
        manager.info("1", "First");
        manager.error("2", "Second");

        assert_eq!(manager.current_notification().unwrap().title, "1");

        manager.tick_at(start);
        manager.tick_at(start + Duration::from_secs(3));

        let second = manager.current_notification().unwrap();
        assert_eq!(second.title, "2");
        assert_eq!(second.displayed_at, Some(start + Duration::from_secs(3)));

        manager.dismiss();
        assert!(!manager.has_notifications());
    }

    #[test]
    fn test_disabled_keeps_errors_only() {
        let mut manager = NotificationManager::default().with_enabled(false);
        manager.info("a", "b");
        manager.warn("a", "b");
        assert!(!manager.has_notifications());
        manager.error("Network", "Could not reach the marketplace");
        assert!(manager.has_notifications());
    }
}
