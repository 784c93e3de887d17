//! JSON frames of the realtime socket.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{RealtimeError, RealtimeResult};
use crate::domain::entities::ConversationId;
use crate::domain::realtime::RealtimeEvent;

/// Decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event(RealtimeEvent),
    Pong,
    /// Frame type this client does not handle.
    Unknown(String),
}

#[derive(Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct ConversationReadData {
    conversation_id: ConversationId,
}

#[derive(Deserialize)]
struct CreditsData {
    balance: i64,
}

pub struct FrameCodec;

impl FrameCodec {
    pub const PING: &'static str = r#"{"type":"ping"}"#;

    /// # Errors
    /// Returns `InvalidFrame` for malformed JSON or a known type with a bad payload.
    pub fn decode(text: &str) -> RealtimeResult<Inbound> {
        let frame: Frame = serde_json::from_str(text)
            .map_err(|e| RealtimeError::invalid_frame(e.to_string()))?;

        let event = match frame.kind.as_str() {
            "pong" => return Ok(Inbound::Pong),
            "message.created" => RealtimeEvent::MessageCreated(data(&frame)?),
            "conversation.read" => {
                let read: ConversationReadData = data(&frame)?;
                RealtimeEvent::ConversationRead(read.conversation_id)
            }
            "notification.created" => RealtimeEvent::NotificationCreated(data(&frame)?),
            "listing.updated" => RealtimeEvent::ListingUpdated(data(&frame)?),
            "credits.updated" => {
                let credits: CreditsData = data(&frame)?;
                RealtimeEvent::CreditsUpdated {
                    balance: credits.balance,
                }
            }
            _ => return Ok(Inbound::Unknown(frame.kind)),
        };

        Ok(Inbound::Event(event))
    }
}

fn data<T: DeserializeOwned>(frame: &Frame) -> RealtimeResult<T> {
    T::deserialize(&frame.data)
        .map_err(|e| RealtimeError::invalid_frame(format!("{}: {e}", frame.kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ConversationId, UserId};

    #[test]
    fn test_decode_message_created() {
        let text = r#"{"type":"message.created","data":{"id":"41","conversation_id":7,"sender_id":2,"body":"still available?","sent_at":"2024-05-01T10:00:00Z","client_nonce":null}}"#;
        let Inbound::Event(RealtimeEvent::MessageCreated(message)) = FrameCodec::decode(text).unwrap()
        else {
            panic!("expected a message event");
        };
        assert_eq!(message.conversation_id(), ConversationId(7));
        assert_eq!(message.sender_id(), UserId(2));
        assert_eq!(message.body(), "still available?");
    }

    #[test]
    fn test_decode_small_payloads() {
        assert_eq!(
            FrameCodec::decode(r#"{"type":"conversation.read","data":{"conversation_id":"9"}}"#)
                .unwrap(),
            Inbound::Event(RealtimeEvent::ConversationRead(ConversationId(9)))
        );
        assert_eq!(
            FrameCodec::decode(r#"{"type":"credits.updated","data":{"balance":120}}"#).unwrap(),
            Inbound::Event(RealtimeEvent::CreditsUpdated { balance: 120 })
        );
        assert_eq!(FrameCodec::decode(r#"{"type":"pong"}"#).unwrap(), Inbound::Pong);
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        assert_eq!(
            FrameCodec::decode(r#"{"type":"typing.started","data":{}}"#).unwrap(),
            Inbound::Unknown("typing.started".into())
        );
    }

    #[test]
    fn test_malformed_frames() {
        assert!(FrameCodec::decode("not json").is_err());
        assert!(FrameCodec::decode(r#"{"data":{}}"#).is_err());
        assert!(FrameCodec::decode(r#"{"type":"credits.updated","data":{}}"#).is_err());
    }
}
