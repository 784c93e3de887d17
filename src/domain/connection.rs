//! Realtime connection status.

use super::realtime::RealtimeEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Offline,
    Error,
}

impl ConnectionStatus {
    /// Status after observing a lifecycle event; data events leave it unchanged.
    #[must_use]
    pub const fn after(self, event: &RealtimeEvent) -> Self {
        match event {
            RealtimeEvent::Connected => Self::Connected,
            RealtimeEvent::Reconnecting { .. } => Self::Reconnecting,
            RealtimeEvent::Disconnected {
                will_retry: true, ..
            } => Self::Reconnecting,
            RealtimeEvent::Disconnected {
                will_retry: false, ..
            } => Self::Disconnected,
            RealtimeEvent::Error {
                recoverable: false, ..
            } => Self::Error,
            _ => self,
        }
    }

    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let status = ConnectionStatus::Connecting.after(&RealtimeEvent::Connected);
        assert!(status.is_live());

        let status = status.after(&RealtimeEvent::Disconnected {
            reason: "closed".into(),
            will_retry: true,
        });
        assert_eq!(status, ConnectionStatus::Reconnecting);

        let status = status.after(&RealtimeEvent::CreditsUpdated { balance: 3 });
        assert_eq!(status, ConnectionStatus::Reconnecting);

        let status = status.after(&RealtimeEvent::Error {
            message: "token rejected".into(),
            recoverable: false,
        });
        assert_eq!(status, ConnectionStatus::Error);
    }
}
