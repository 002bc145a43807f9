use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use livefeed_client::client::NotificationClient;
use livefeed_client::config::Settings;
use livefeed_client::connection::Outbound;
use livefeed_client::render::{SharedSink, WriterSink};
use livefeed_client::{shutdown, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    telemetry::init_tracing();

    // Load configuration
    let settings = Settings::new()?;
    tracing::info!(page_url = %settings.page.url, "Configuration loaded");

    // Rendered lines go to stdout, one per received notification
    let sink: SharedSink = Arc::new(Mutex::new(WriterSink::new(std::io::stdout())));

    let (mut client, outbound) = NotificationClient::from_settings(&settings, sink)?;
    let shutdown_tx = client.shutdown_signal();

    // Ctrl+C / SIGTERM become a best-effort transport close
    tokio::spawn(shutdown::wait_for_signal(shutdown_tx));

    // On the duplex variant, stdin lines are sent as raw text frames
    let stdin_task = outbound.map(|outbound| tokio::spawn(forward_stdin(outbound)));

    let result = client.start().await;

    if let Some(task) = stdin_task {
        task.abort();
    }

    tracing::info!("Client shutdown complete");
    result.map_err(Into::into)
}

/// Forward stdin lines to the send handle.
///
/// Lines typed while the connection is not open are dropped with a warning,
/// never queued.
async fn forward_stdin(outbound: Outbound) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        outbound.send(line);
    }
}
