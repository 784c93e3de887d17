use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{Notify, mpsc};
use tokio::time::{Instant, interval_at, sleep};
use tracing::{debug, error, info, warn};

use super::codec::Inbound;
use super::connection::{self, SocketReceiver, SocketSender};
use super::constants::{
    MAX_MISSED_PONGS, MAX_RECONNECT_ATTEMPTS, PING_INTERVAL, RECONNECT_DELAY_BASE,
    RECONNECT_DELAY_MAX, RECONNECT_JITTER_MAX,
};
use super::error::{RealtimeError, RealtimeResult};
use crate::domain::realtime::RealtimeEvent;

pub struct RealtimeClientConfig {
    pub url: String,
    pub auto_reconnect: bool,
    pub max_reconnect_attempts: u32,
}

impl RealtimeClientConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auto_reconnect: true,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }

    #[must_use]
    pub const fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }
}

/// Background WebSocket connection that turns server frames into [`RealtimeEvent`]s.
pub struct RealtimeClient {
    config: RealtimeClientConfig,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl RealtimeClient {
    #[must_use]
    pub fn new(config: RealtimeClientConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// # Errors
    ///
    /// Returns `RealtimeError::AlreadyConnected` if a connection loop is active.
    pub fn connect(
        &mut self,
        token: &str,
    ) -> RealtimeResult<mpsc::UnboundedReceiver<RealtimeEvent>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(RealtimeError::AlreadyConnected);
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let config = LoopConfig {
            url: socket_url(&self.config.url, token),
            auto_reconnect: self.config.auto_reconnect,
            max_attempts: self.config.max_reconnect_attempts,
        };
        let running = self.running.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let result = std::panic::AssertUnwindSafe(run_realtime_loop(
                config,
                event_tx.clone(),
                running.clone(),
                shutdown,
            ));

            if let Err(panic_info) = result.catch_unwind().await {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                error!(panic = %panic_msg, "Realtime task panicked");
                running.store(false, Ordering::SeqCst);
                let _ = event_tx.send(RealtimeEvent::Error {
                    message: format!("Realtime task panicked: {panic_msg}"),
                    recoverable: false,
                });
            }
        });

        Ok(event_rx)
    }

    pub fn disconnect(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn socket_url(base: &str, token: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}token={token}")
}

struct LoopConfig {
    url: String,
    auto_reconnect: bool,
    max_attempts: u32,
}

async fn run_realtime_loop(
    config: LoopConfig,
    event_tx: mpsc::UnboundedSender<RealtimeEvent>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    let mut reconnect_attempts: u32 = 0;

    while running.load(Ordering::SeqCst) {
        let error = match connection::open(&config.url).await {
            Ok((sender, receiver)) => {
                info!("Realtime connected");
                reconnect_attempts = 0;
                let _ = event_tx.send(RealtimeEvent::Connected);
                run_connection(sender, receiver, &event_tx, &running, &shutdown).await
            }
            Err(e) => Some(e),
        };

        if !running.load(Ordering::SeqCst) {
            break;
        }

        let Some(error) = error else {
            break;
        };

        warn!(error = %error, "Realtime connection lost");
        let will_retry = error.should_reconnect()
            && config.auto_reconnect
            && reconnect_attempts < config.max_attempts;

        if !error.should_reconnect() {
            let _ = event_tx.send(RealtimeEvent::Error {
                message: error.to_string(),
                recoverable: false,
            });
            break;
        }

        let _ = event_tx.send(RealtimeEvent::Disconnected {
            reason: error.to_string(),
            will_retry,
        });

        if !config.auto_reconnect {
            break;
        }

        if reconnect_attempts >= config.max_attempts {
            error!(
                attempts = reconnect_attempts,
                "Max reconnection attempts exceeded"
            );
            let _ = event_tx.send(RealtimeEvent::Error {
                message: format!(
                    "Max reconnection attempts ({}) exceeded",
                    config.max_attempts
                ),
                recoverable: false,
            });
            break;
        }

        reconnect_attempts += 1;
        let delay = calculate_backoff_delay(reconnect_attempts - 1);
        info!(
            attempt = reconnect_attempts,
            delay_ms = delay.as_millis(),
            "Reconnecting to realtime"
        );
        let _ = event_tx.send(RealtimeEvent::Reconnecting {
            attempt: reconnect_attempts,
        });

        tokio::select! {
            () = sleep(delay) => {}
            () = shutdown.notified() => break,
        }
    }

    running.store(false, Ordering::SeqCst);
    info!("Realtime loop terminated");
}

/// Pumps one connection until it fails or the client stops.
/// Returns `None` on a requested shutdown.
async fn run_connection(
    mut sender: SocketSender,
    mut receiver: SocketReceiver,
    event_tx: &mpsc::UnboundedSender<RealtimeEvent>,
    running: &Arc<AtomicBool>,
    shutdown: &Arc<Notify>,
) -> Option<RealtimeError> {
    let mut ticker = interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);
    let mut missed_pongs: u32 = 0;

    let error = loop {
        if !running.load(Ordering::SeqCst) {
            break None;
        }

        tokio::select! {
            () = shutdown.notified() => break None,
            _ = ticker.tick() => {
                if missed_pongs >= MAX_MISSED_PONGS {
                    warn!(missed = missed_pongs, "Realtime pong not received, connection may be dead");
                }
                if let Err(e) = sender.ping().await {
                    break Some(e);
                }
                missed_pongs += 1;
                debug!("Sent realtime ping");
            }
            inbound = receiver.receive() => match inbound {
                Ok(Inbound::Pong) => missed_pongs = 0,
                Ok(Inbound::Event(event)) => {
                    if event_tx.send(event).is_err() {
                        debug!("Realtime event channel closed");
                        running.store(false, Ordering::SeqCst);
                        break None;
                    }
                }
                Ok(Inbound::Unknown(kind)) => debug!(kind, "Ignoring unknown realtime frame"),
                Err(e) => break Some(e),
            },
        }
    };

    if error.is_none() {
        sender.close().await;
    }
    error
}

#[allow(clippy::cast_possible_truncation)]
fn calculate_backoff_delay(attempt: u32) -> Duration {
    let base_delay = RECONNECT_DELAY_BASE.as_millis() as u64;
    let max_delay = RECONNECT_DELAY_MAX.as_millis() as u64;
    let jitter_max = RECONNECT_JITTER_MAX.as_millis() as u64;

    let exponential_delay = base_delay.saturating_mul(2_u64.saturating_pow(attempt.min(6)));
    let capped_delay = exponential_delay.min(max_delay);

    Duration::from_millis(capped_delay.saturating_add(rand_jitter(jitter_max)))
}

fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);

    nanos % max.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;

    #[test]
    fn test_backoff_delay() {
        let delay0 = calculate_backoff_delay(0);
        let delay1 = calculate_backoff_delay(1);
        let delay2 = calculate_backoff_delay(2);

        assert!(delay0 >= RECONNECT_DELAY_BASE);
        assert!(delay0 < delay1);
        assert!(delay1 < delay2);

        let delay_max = calculate_backoff_delay(100);
        assert!(delay_max <= RECONNECT_DELAY_MAX + RECONNECT_JITTER_MAX);
    }

    #[test]
    fn test_socket_url() {
        assert_eq!(
            socket_url("ws://localhost:8080/ws", "abc"),
            "ws://localhost:8080/ws?token=abc"
        );
        assert_eq!(socket_url("wss://h/ws?v=1", "abc"), "wss://h/ws?v=1&token=abc");
    }

    #[test]
    fn test_client_initial_state() {
        let client = RealtimeClient::new(RealtimeClientConfig::new("ws://localhost:1/ws"));
        assert!(!client.is_running());
    }

    #[tokio::test]
    async fn test_events_then_fatal_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            socket
                .send(WsMessage::Text(
                    r#"{"type":"credits.updated","data":{"balance":42}}"#.into(),
                ))
                .await
                .unwrap();
            socket
                .send(WsMessage::Text(r#"{"type":"mystery","data":{}}"#.into()))
                .await
                .unwrap();
            socket
                .send(WsMessage::Close(Some(CloseFrame {
                    code: WsCloseCode::from(4001),
                    reason: "token rejected".into(),
                })))
                .await
                .unwrap();
            while socket.next().await.is_some() {}
        });

        let mut client = RealtimeClient::new(RealtimeClientConfig::new(format!("ws://{addr}/ws")));
        let mut events = client.connect("bz_live_8f3c2a9d41e07b66c5d2").unwrap();
        assert!(matches!(
            client.connect("again"),
            Err(RealtimeError::AlreadyConnected)
        ));

        assert_eq!(events.recv().await, Some(RealtimeEvent::Connected));
        assert_eq!(
            events.recv().await,
            Some(RealtimeEvent::CreditsUpdated { balance: 42 })
        );
        assert!(matches!(
            events.recv().await,
            Some(RealtimeEvent::Error {
                recoverable: false,
                ..
            })
        ));
        assert_eq!(events.recv().await, None);
        assert!(!client.is_running());
    }

    #[tokio::test]
    async fn test_no_reconnect_reports_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = RealtimeClientConfig::new(format!("ws://{addr}/ws")).with_auto_reconnect(false);
        let mut client = RealtimeClient::new(config);
        let mut events = client.connect("token").unwrap();

        assert!(matches!(
            events.recv().await,
            Some(RealtimeEvent::Disconnected {
                will_retry: false,
                ..
            })
        ));
        assert_eq!(events.recv().await, None);
    }
}
