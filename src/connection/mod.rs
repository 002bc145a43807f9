//! Connection lifecycle shared by both transport variants.
//!
//! There is at most one live transport per client. Its state transitions
//! (`Connecting` → `Open` → `Closed`) are driven entirely by the transport
//! implementation and published on a watch channel; application code only
//! observes them.

mod factory;

pub use factory::create_transport;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};

use crate::error::ClientError;

/// Observable lifecycle of the live transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// How a transport session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Clean close: server close frame, stream end, or shutdown signal.
    Closed,
    /// The server asked for a full reload via a named `refresh` event.
    Refresh,
    /// Establishment or mid-session failure.
    Failed {
        error: ClientError,
        /// Whether the session reached `Open` before failing. An
        /// established session refunds the reconnect budget.
        opened: bool,
    },
}

/// What the supervisor does when a session fails.
///
/// The two observed variants hardcoded different policies (reconnect vs.
/// reload); here the policy is a value the transport defaults and the
/// caller can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Reconnect with backoff (duplex variant default)
    Reconnect,
    /// Treat the failure like a page reload (server-push variant default)
    Reload,
}

/// One live transport to the backend.
///
/// A session runs until the transport closes, fails, or the server requests
/// a refresh. Implementations own the wire; callers own the policy.
#[async_trait]
pub trait Transport: Send {
    /// Transport kind for logs.
    fn kind(&self) -> &'static str;

    /// Default recovery policy for this variant.
    fn recovery_policy(&self) -> RecoveryPolicy;

    /// Run one session to completion.
    async fn run_session(&mut self, shutdown: broadcast::Receiver<()>) -> SessionEnd;
}

/// Handle for sending raw outbound text frames on the duplex variant.
///
/// Frames are transmitted verbatim, without an envelope (the inbound JSON
/// envelope is not mirrored outbound), and only while the connection is
/// open. There is no queueing: a frame sent while not open is dropped with
/// a warning.
#[derive(Debug, Clone)]
pub struct Outbound {
    state: watch::Receiver<ConnectionState>,
    frames: mpsc::UnboundedSender<String>,
}

impl Outbound {
    pub(crate) fn new(
        state: watch::Receiver<ConnectionState>,
        frames: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self { state, frames }
    }

    /// Connection state as last published by the transport.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Send `text` verbatim if the connection is open.
    ///
    /// Returns `true` if the frame was handed to the transport.
    pub fn send(&self, text: impl Into<String>) -> bool {
        if self.state() != ConnectionState::Open {
            tracing::warn!("Connection is not open, cannot send message");
            return false;
        }
        if self.frames.send(text.into()).is_err() {
            tracing::warn!("Transport is gone, dropping outbound frame");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_is_refused_while_connecting() {
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
        let outbound = Outbound::new(state_rx, frame_tx);

        assert!(!outbound.send("ping"));
        assert!(frame_rx.try_recv().is_err());
    }

    #[test]
    fn test_send_passes_raw_text_while_open() {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
        let outbound = Outbound::new(state_rx, frame_tx);

        state_tx.send(ConnectionState::Open).unwrap();
        assert!(outbound.send("ping"));
        assert_eq!(frame_rx.try_recv().unwrap(), "ping");
    }

    #[test]
    fn test_send_is_refused_after_close() {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Open);
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
        let outbound = Outbound::new(state_rx, frame_tx);

        state_tx.send(ConnectionState::Closed).unwrap();
        assert!(!outbound.send("late"));
        assert!(frame_rx.try_recv().is_err());
    }
}
