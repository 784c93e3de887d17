//! Desktop notifications and the terminal bell.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::ports::NotificationPort;

#[derive(Debug, Default)]
pub struct DesktopNotificationService {
    desktop: bool,
    sound: AtomicBool,
}

impl DesktopNotificationService {
    #[must_use]
    pub fn new(desktop: bool, sound: bool) -> Self {
        Self {
            desktop,
            sound: AtomicBool::new(sound),
        }
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound.load(Ordering::Relaxed)
    }
}

impl NotificationPort for DesktopNotificationService {
    #[cfg(feature = "notify")]
    fn send(&self, title: &str, body: &str) {
        if !self.desktop {
            return;
        }

        let title = title.to_string();
        let body = body.to_string();

        tokio::task::spawn_blocking(move || {
            if let Err(e) = notify_rust::Notification::new()
                .summary(&title)
                .body(&body)
                .appname("Bazaar")
                .show()
            {
                tracing::warn!(error = %e, "Failed to show notification");
            }
        });
    }

    #[cfg(not(feature = "notify"))]
    fn send(&self, title: &str, _body: &str) {
        if self.desktop {
            tracing::debug!(title, "Notify feature disabled, skipping desktop notification");
        }
    }

    fn play_sound(&self) {
        if !self.sound_enabled() {
            return;
        }
        // stdout belongs to the terminal UI.
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07").and_then(|()| stderr.flush());
    }

    fn set_sound_enabled(&self, enabled: bool) {
        self.sound.store(enabled, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_toggle() {
        let service = DesktopNotificationService::new(false, false);
        assert!(!service.sound_enabled());
        service.set_sound_enabled(true);
        assert!(service.sound_enabled());
    }
}
