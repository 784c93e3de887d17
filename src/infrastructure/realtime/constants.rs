use std::time::Duration;

pub const PING_INTERVAL: Duration = Duration::from_secs(30);
/// Missed pongs after which the connection is reported as stale.
pub const MAX_MISSED_PONGS: u32 = 2;

pub const RECONNECT_DELAY_BASE: Duration = Duration::from_secs(1);
pub const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(60);
pub const RECONNECT_JITTER_MAX: Duration = Duration::from_millis(500);
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(15);

/// Close codes sent by the marketplace socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    Normal,
    GoingAway,
    TokenRejected,
    Other(u16),
}

impl CloseCode {
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => Self::Normal,
            1001 => Self::GoingAway,
            4001 => Self::TokenRejected,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::TokenRejected)
    }
}
