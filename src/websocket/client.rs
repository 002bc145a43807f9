//! Duplex WebSocket transport.
//!
//! Inbound text frames carry a JSON [`NotificationEnvelope`]; outbound
//! frames are raw text handed over by the [`Outbound`] handle. Binary, ping
//! and pong frames are ignored.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::connection::{ConnectionState, Outbound, RecoveryPolicy, SessionEnd, Transport};
use crate::notification::NotificationEnvelope;
use crate::render::{Clock, RenderedLine, SharedSink};

pub struct WebSocketTransport {
    url: Url,
    sink: SharedSink,
    clock: Arc<dyn Clock>,
    state_tx: watch::Sender<ConnectionState>,
    outbound_rx: mpsc::UnboundedReceiver<String>,
}

impl WebSocketTransport {
    /// Build the duplex transport and its send handle.
    pub fn new(url: Url, sink: SharedSink, clock: Arc<dyn Clock>) -> (Self, Outbound) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();

        let transport = Self {
            url,
            sink,
            clock,
            state_tx,
            outbound_rx: frame_rx,
        };
        (transport, Outbound::new(state_rx, frame_tx))
    }

    /// Parse and render one inbound text frame.
    ///
    /// A malformed payload is logged and dropped; it never produces a
    /// rendered line and never disturbs the connection.
    fn handle_text(&self, payload: &str) {
        match NotificationEnvelope::parse(payload) {
            Ok(envelope) => {
                tracing::debug!(message = %envelope.message, "Received notification");
                let line = RenderedLine::for_message(self.clock.now_ms(), &envelope.message);
                self.sink
                    .lock()
                    .expect("line sink lock poisoned")
                    .append(line);
            }
            Err(e) => {
                tracing::warn!(error = %e, payload = %payload, "Failed to parse notification payload");
            }
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn kind(&self) -> &'static str {
        "websocket"
    }

    fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy::Reconnect
    }

    async fn run_session(&mut self, mut shutdown: broadcast::Receiver<()>) -> SessionEnd {
        let _ = self.state_tx.send(ConnectionState::Connecting);
        tracing::info!(url = %self.url, "Connecting WebSocket");

        let (mut stream, _response) = match connect_async(self.url.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "WebSocket connection failed");
                let _ = self.state_tx.send(ConnectionState::Closed);
                return SessionEnd::Failed {
                    error: e.into(),
                    opened: false,
                };
            }
        };

        let _ = self.state_tx.send(ConnectionState::Open);
        tracing::info!("Connected");

        let end = loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, closing WebSocket");
                    // Best effort, like a page-unload close: the frame may
                    // not reach the server before teardown.
                    let _ = stream.send(Message::Close(None)).await;
                    break SessionEnd::Closed;
                }
                Some(text) = self.outbound_rx.recv() => {
                    if let Err(e) = stream.send(Message::text(text)).await {
                        tracing::error!(error = %e, "Failed to send message");
                        break SessionEnd::Failed { error: e.into(), opened: true };
                    }
                }
                incoming = stream.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => self.handle_text(text.as_str()),
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Disconnected by server");
                            break SessionEnd::Closed;
                        }
                        Some(Ok(_)) => {} // binary / ping / pong
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "WebSocket error");
                            break SessionEnd::Failed { error: e.into(), opened: true };
                        }
                        None => {
                            tracing::info!("Disconnected");
                            break SessionEnd::Closed;
                        }
                    }
                }
            }
        };

        let _ = self.state_tx.send(ConnectionState::Closed);
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{FixedClock, MemorySink};
    use std::sync::Mutex;

    fn transport_with_sink() -> (WebSocketTransport, Arc<Mutex<MemorySink>>) {
        let sink = Arc::new(Mutex::new(MemorySink::new()));
        let url = Url::parse("ws://localhost:8080/ws").unwrap();
        let (transport, _outbound) =
            WebSocketTransport::new(url, sink.clone(), Arc::new(FixedClock(1000)));
        (transport, sink)
    }

    #[test]
    fn test_valid_envelope_renders_timestamped_line() {
        let (transport, sink) = transport_with_sink();

        transport.handle_text(r#"{"message":"hello"}"#);

        assert_eq!(sink.lock().unwrap().texts(), vec!["1000  hello"]);
    }

    #[test]
    fn test_extra_envelope_fields_are_ignored() {
        let (transport, sink) = transport_with_sink();

        transport.handle_text(r#"{"message":"hi","source":"demo"}"#);

        assert_eq!(sink.lock().unwrap().texts(), vec!["1000  hi"]);
    }

    #[test]
    fn test_malformed_payload_renders_nothing() {
        let (transport, sink) = transport_with_sink();

        transport.handle_text("not json");
        transport.handle_text(r#"{"priority":1}"#);

        assert!(sink.lock().unwrap().lines().is_empty());
    }

    #[test]
    fn test_frames_render_in_arrival_order() {
        let (transport, sink) = transport_with_sink();

        transport.handle_text(r#"{"message":"first"}"#);
        transport.handle_text(r#"{"message":"second"}"#);
        transport.handle_text(r#"{"message":"third"}"#);

        assert_eq!(
            sink.lock().unwrap().texts(),
            vec!["1000  first", "1000  second", "1000  third"]
        );
    }
}
