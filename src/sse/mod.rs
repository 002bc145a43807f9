//! Server-push transport: a one-way Server-Sent-Events stream.
//!
//! Default (`message`) events are rendered verbatim; a named `refresh`
//! event ends the session with [`SessionEnd::Refresh`] regardless of its
//! payload. Other named event types are not listened for and are dropped,
//! as the original page only registered those two handlers.

use std::sync::Arc;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use tokio::sync::{broadcast, watch};
use url::Url;

use crate::connection::{ConnectionState, RecoveryPolicy, SessionEnd, Transport};
use crate::error::ClientError;
use crate::render::{Clock, RenderedLine, SharedSink};

/// Event name that forces a full reload.
const REFRESH_EVENT: &str = "refresh";

/// Default event name carried by unnamed SSE events.
const MESSAGE_EVENT: &str = "message";

pub struct SseTransport {
    url: Url,
    sink: SharedSink,
    clock: Arc<dyn Clock>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    http: reqwest::Client,
}

impl SseTransport {
    pub fn new(url: Url, sink: SharedSink, clock: Arc<dyn Clock>) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        Self {
            url,
            sink,
            clock,
            state_tx,
            state_rx,
            http: reqwest::Client::new(),
        }
    }

    /// Connection state as last published by the transport.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    fn render(&self, data: &str) {
        let line = RenderedLine::for_event(self.clock.now_ms(), data);
        self.sink
            .lock()
            .expect("line sink lock poisoned")
            .append(line);
    }
}

#[async_trait]
impl Transport for SseTransport {
    fn kind(&self) -> &'static str {
        "sse"
    }

    fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy::Reload
    }

    async fn run_session(&mut self, mut shutdown: broadcast::Receiver<()>) -> SessionEnd {
        let _ = self.state_tx.send(ConnectionState::Connecting);
        tracing::info!(url = %self.url, "Opening event stream");

        let response = match self
            .http
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Event stream request failed");
                let _ = self.state_tx.send(ConnectionState::Closed);
                return SessionEnd::Failed {
                    error: e.into(),
                    opened: false,
                };
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = %status, "Event stream endpoint refused");
            let _ = self.state_tx.send(ConnectionState::Closed);
            return SessionEnd::Failed {
                error: ClientError::EventStream(format!("unexpected status {}", status)),
                opened: false,
            };
        }

        let mut events = response.bytes_stream().eventsource();
        let _ = self.state_tx.send(ConnectionState::Open);
        tracing::info!("Event stream established");

        let end = loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, closing event stream");
                    break SessionEnd::Closed;
                }
                event = events.next() => {
                    match event {
                        Some(Ok(event)) if event.event == REFRESH_EVENT => {
                            tracing::info!(data = %event.data, "Refresh event received");
                            break SessionEnd::Refresh;
                        }
                        Some(Ok(event)) if event.event == MESSAGE_EVENT => {
                            tracing::debug!(data = %event.data, "Received event");
                            self.render(&event.data);
                        }
                        Some(Ok(event)) => {
                            tracing::debug!(event = %event.event, "Ignoring unhandled event type");
                        }
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "Event stream failed");
                            break SessionEnd::Failed {
                                error: ClientError::EventStream(e.to_string()),
                                opened: true,
                            };
                        }
                        None => {
                            tracing::info!("Event stream ended");
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
