use thiserror::Error;

use super::constants::CloseCode;

pub type RealtimeResult<T> = Result<T, RealtimeError>;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("connection closed with code {code}: {reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("websocket error: {message}")]
    WebSocket { message: String },

    #[error("invalid frame: {message}")]
    InvalidFrame { message: String },

    #[error("timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("already connecting or connected")]
    AlreadyConnected,
}

impl RealtimeError {
    #[must_use]
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn websocket(message: impl Into<String>) -> Self {
        Self::WebSocket {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    #[must_use]
    pub const fn close_code(&self) -> Option<u16> {
        match self {
            Self::ConnectionClosed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the loop should try again after this error.
    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        match self {
            Self::ConnectionClosed { code, .. } => !CloseCode::from_u16(*code).is_fatal(),
            Self::ConnectionFailed { .. }
            | Self::WebSocket { .. }
            | Self::Timeout { .. }
            | Self::InvalidFrame { .. } => true,
            Self::AlreadyConnected => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_rejection_is_fatal() {
        let err = RealtimeError::ConnectionClosed {
            code: 4001,
            reason: "token rejected".into(),
        };
        assert!(!err.should_reconnect());
        assert_eq!(err.close_code(), Some(4001));
    }

    #[test]
    fn test_transport_errors_reconnect() {
        assert!(RealtimeError::connection_failed("refused").should_reconnect());
        assert!(RealtimeError::timeout("connection").should_reconnect());
        assert!(
            RealtimeError::ConnectionClosed {
                code: 1006,
                reason: String::new()
            }
            .should_reconnect()
        );
        assert!(!RealtimeError::AlreadyConnected.should_reconnect());
    }
}
