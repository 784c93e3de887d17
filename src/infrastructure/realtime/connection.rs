use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use super::codec::{FrameCodec, Inbound};
use super::constants::CONNECTION_TIMEOUT;
use super::error::{RealtimeError, RealtimeResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens a socket and returns its write and read halves.
pub async fn open(url: &str) -> RealtimeResult<(SocketSender, SocketReceiver)> {
    let (stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(url))
        .await
        .map_err(|_| RealtimeError::timeout("connection"))?
        .map_err(|e| RealtimeError::connection_failed(e.to_string()))?;

    let (writer, reader) = stream.split();
    Ok((SocketSender(writer), SocketReceiver(reader)))
}

pub struct SocketSender(SplitSink<WsStream, WsMessage>);

impl SocketSender {
    pub async fn ping(&mut self) -> RealtimeResult<()> {
        self.0
            .send(WsMessage::Text(FrameCodec::PING.into()))
            .await
            .map_err(|e| RealtimeError::websocket(e.to_string()))
    }

    pub async fn close(mut self) {
        let _ = self.0.close().await;
        debug!("Realtime socket closed");
    }
}

pub struct SocketReceiver(SplitStream<WsStream>);

impl SocketReceiver {
    /// Next decoded frame. Malformed frames are logged and skipped.
    ///
    /// Protocol pings are answered by tungstenite itself.
    pub async fn receive(&mut self) -> RealtimeResult<Inbound> {
        loop {
            match self.0.next().await {
                Some(Ok(WsMessage::Text(text))) => match FrameCodec::decode(&text) {
                    Ok(inbound) => return Ok(inbound),
                    Err(e) => warn!(error = %e, "Dropping malformed realtime frame"),
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = frame.map_or_else(
                        || (1000, "Normal closure".to_string()),
                        |f| (f.code.into(), f.reason.to_string()),
                    );
                    return Err(RealtimeError::ConnectionClosed { code, reason });
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    trace!(len = data.len(), "Ignoring binary realtime frame");
                }
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => return Err(RealtimeError::websocket(e.to_string())),
                None => {
                    return Err(RealtimeError::ConnectionClosed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
            }
        }
    }
}
