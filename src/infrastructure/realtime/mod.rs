//! Realtime WebSocket adapter.

mod client;
mod codec;
mod connection;
mod constants;
mod error;

pub use client::{RealtimeClient, RealtimeClientConfig};
pub use codec::{FrameCodec, Inbound};
pub use constants::CloseCode;
pub use error::{RealtimeError, RealtimeResult};
