use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::backoff::BackoffConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub reconnect: BackoffConfig,
}

/// The page whose URL the transport endpoints are derived from.
///
/// This stands in for `window.location.href`: the client never fetches the
/// page itself, it only transforms the URL.
#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    #[serde(default = "default_page_url")]
    pub url: String,
}

/// Which transport variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Duplex WebSocket connection (JSON envelopes in, raw text out)
    Websocket,
    /// Unidirectional Server-Sent-Events stream
    Sse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_transport_kind")]
    pub kind: TransportKind,
}

fn default_page_url() -> String {
    "http://localhost:8080/websockets.html".to_string()
}

fn default_transport_kind() -> TransportKind {
    TransportKind::Websocket
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("page.url", default_page_url())?
            .set_default("transport.kind", "websocket")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // PAGE_URL, TRANSPORT_KIND, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: default_page_url(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: default_transport_kind(),
        }
    }
}
