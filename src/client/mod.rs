//! The owning client object: one live transport, explicit lifecycle.
//!
//! Instead of a bare page-global connection handle, the client owns the
//! transport and runs sessions in a supervisor loop, applying the recovery
//! policy when a session fails and the reload hook when the server requests
//! a refresh.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::backoff::{BackoffConfig, ReconnectBackoff};
use crate::config::Settings;
use crate::connection::{create_transport, Outbound, RecoveryPolicy, SessionEnd, Transport};
use crate::error::{ClientError, Result};
use crate::render::{SharedSink, SystemClock};

/// Invoked when the server requests a full reload, or when a failure is
/// handled with [`RecoveryPolicy::Reload`]. The supervisor restarts the
/// session right after the hook returns, which is as close to a page reload
/// as a non-browser host gets.
pub trait ReloadHook: Send + Sync {
    fn on_reload(&self);
}

/// Default hook: log the reload and let the supervisor restart the session.
#[derive(Debug, Default)]
pub struct LogReload;

impl ReloadHook for LogReload {
    fn on_reload(&self) {
        tracing::info!("Reload requested");
    }
}

pub struct NotificationClient {
    transport: Box<dyn Transport>,
    backoff: ReconnectBackoff,
    reload: Arc<dyn ReloadHook>,
    shutdown: broadcast::Sender<()>,
    // Held for the client's whole life so a stop requested between
    // sessions (during a recovery wait) is buffered, not lost.
    shutdown_rx: broadcast::Receiver<()>,
}

impl NotificationClient {
    pub fn new(transport: Box<dyn Transport>, backoff_config: BackoffConfig) -> Self {
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        Self {
            transport,
            backoff: ReconnectBackoff::new(backoff_config),
            reload: Arc::new(LogReload),
            shutdown,
            shutdown_rx,
        }
    }

    /// Build the client for the configured transport variant.
    ///
    /// Returns the send handle when the variant supports sending.
    pub fn from_settings(settings: &Settings, sink: SharedSink) -> Result<(Self, Option<Outbound>)> {
        let (transport, outbound) = create_transport(settings, sink, Arc::new(SystemClock))?;
        Ok((
            Self::new(transport, settings.reconnect.clone()),
            outbound,
        ))
    }

    /// Replace the reload hook.
    pub fn with_reload_hook(mut self, hook: Arc<dyn ReloadHook>) -> Self {
        self.reload = hook;
        self
    }

    /// Sender half of the shutdown signal, for wiring to signal handlers.
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Request a best-effort close of the live transport.
    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }

    /// Run sessions until a clean close, shutdown, or retry exhaustion.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!(transport = self.transport.kind(), "Starting notification client");

        loop {
            if self.stop_requested() {
                tracing::info!("Shutdown requested, not starting a new session");
                return Ok(());
            }

            let outcome = self.transport.run_session(self.shutdown.subscribe()).await;

            match outcome {
                SessionEnd::Closed => {
                    tracing::info!(transport = self.transport.kind(), "Connection closed");
                    return Ok(());
                }
                SessionEnd::Refresh => {
                    self.reload.on_reload();
                    // A reload is a fresh page load: the retry budget starts over.
                    self.backoff.reset();
                }
                SessionEnd::Failed { error, opened } => {
                    if opened {
                        self.backoff.reset();
                    }
                    // Both recovery policies pace their restarts through the
                    // backoff budget; a persistently unreachable endpoint is
                    // surfaced instead of being hammered in a hot loop.
                    let delay = match self.backoff.next_delay() {
                        Some(delay) => delay,
                        None => {
                            let attempts = self.backoff.attempt();
                            tracing::error!(
                                error = %error,
                                attempts = attempts,
                                "Transport failed and the retry budget is exhausted"
                            );
                            return Err(ClientError::RetriesExhausted { attempts });
                        }
                    };

                    tracing::error!(
                        error = %error,
                        attempt = self.backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Transport failed, recovering"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.shutdown_rx.recv() => {
                            tracing::info!("Shutdown requested while waiting to recover");
                            return Ok(());
                        }
                    }

                    if self.transport.recovery_policy() == RecoveryPolicy::Reload {
                        self.reload.on_reload();
                    }
                }
            }
        }
    }

    /// Whether a stop was requested while no session was live.
    fn stop_requested(&mut self) -> bool {
        !matches!(
            self.shutdown_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        )
    }
}
