//! Factory for the configured transport variant.

use std::sync::Arc;

use crate::config::{Settings, TransportKind};
use crate::connection::{Outbound, Transport};
use crate::endpoint;
use crate::error::Result;
use crate::render::{Clock, SharedSink};
use crate::sse::SseTransport;
use crate::websocket::WebSocketTransport;

/// Build the transport selected by the configuration.
///
/// The send handle exists only for the duplex variant; the server-push
/// stream is one-way.
pub fn create_transport(
    settings: &Settings,
    sink: SharedSink,
    clock: Arc<dyn Clock>,
) -> Result<(Box<dyn Transport>, Option<Outbound>)> {
    match settings.transport.kind {
        TransportKind::Websocket => {
            let url = endpoint::derive_websocket_url(&settings.page.url)?;
            let (transport, outbound) = WebSocketTransport::new(url, sink, clock);
            Ok((Box::new(transport), Some(outbound)))
        }
        TransportKind::Sse => {
            let url = endpoint::derive_sse_url(&settings.page.url)?;
            let transport = SseTransport::new(url, sink, clock);
            Ok((Box::new(transport), None))
        }
    }
}
