/// Port for desktop notifications and the notification sound.
pub trait NotificationPort: Send + Sync {
    /// Shows a system notification.
    fn send(&self, title: &str, body: &str);

    /// Plays the notification sound when enabled.
    fn play_sound(&self);

    /// Turns the notification sound on or off at runtime.
    fn set_sound_enabled(&self, _enabled: bool) {}
}
