//! End-to-end transport tests against in-process servers.
//!
//! The WebSocket side runs a real tungstenite acceptor; the SSE side is a
//! raw `text/event-stream` responder on a TCP socket. No external backend
//! is required.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use livefeed_client::connection::{ConnectionState, SessionEnd, Transport};
use livefeed_client::render::{MemorySink, SharedSink, SystemClock};
use livefeed_client::sse::SseTransport;
use livefeed_client::websocket::WebSocketTransport;

fn memory_sink() -> (SharedSink, Arc<Mutex<MemorySink>>) {
    let inspect = Arc::new(Mutex::new(MemorySink::new()));
    let sink: SharedSink = inspect.clone();
    (sink, inspect)
}

async fn wait_for_open(state: impl Fn() -> ConnectionState) {
    for _ in 0..200 {
        if state() == ConnectionState::Open {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("connection never reached Open");
}

// =============================================================================
// WebSocket (duplex) transport
// =============================================================================

#[tokio::test]
async fn test_websocket_renders_envelopes_in_arrival_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let frames = [
            r#"{"message":"first"}"#,
            "not json",
            r#"{"message":"second","extra":42}"#,
            r#"{"message":"third"}"#,
        ];
        for frame in frames {
            ws.send(Message::text(frame.to_string())).await.unwrap();
        }
        ws.send(Message::Close(None)).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let (sink, inspect) = memory_sink();
    let url = Url::parse(&format!("ws://{}/ws", addr)).unwrap();
    let (mut transport, _outbound) = WebSocketTransport::new(url, sink, Arc::new(SystemClock));

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
    let end = transport.run_session(shutdown_tx.subscribe()).await;
    server.await.unwrap();

    assert!(matches!(end, SessionEnd::Closed));

    let sink = inspect.lock().unwrap();
    let texts = sink.texts();
    // The malformed frame is dropped; the rest render in arrival order.
    assert_eq!(texts.len(), 3);
    assert!(texts[0].ends_with("  first"), "got {:?}", texts[0]);
    assert!(texts[1].ends_with("  second"), "got {:?}", texts[1]);
    assert!(texts[2].ends_with("  third"), "got {:?}", texts[2]);

    let lines = sink.lines();
    assert!(lines.windows(2).all(|w| w[0].received_at_ms <= w[1].received_at_ms));
}

#[tokio::test]
async fn test_websocket_sends_raw_text_only_while_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
            .await
            .unwrap()
            .unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // The first frame must arrive verbatim, with no JSON wrapping.
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), "ping"),
            other => panic!("unexpected frame {:?}", other),
        }
        ws.send(Message::Close(None)).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let (sink, _inspect) = memory_sink();
    let url = Url::parse(&format!("ws://{}/ws", addr)).unwrap();
    let (mut transport, outbound) = WebSocketTransport::new(url, sink, Arc::new(SystemClock));

    // Not open yet: refused, nothing transmitted.
    assert!(!outbound.send("early"));

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
    let shutdown = shutdown_tx.subscribe();
    let session = tokio::spawn(async move { transport.run_session(shutdown).await });

    let probe = outbound.clone();
    wait_for_open(move || probe.state()).await;
    assert!(outbound.send("ping"));

    let end = session.await.unwrap();
    server.await.unwrap();
    assert!(matches!(end, SessionEnd::Closed));

    // Closed again: refused.
    assert_eq!(outbound.state(), ConnectionState::Closed);
    assert!(!outbound.send("late"));
}

#[tokio::test]
async fn test_websocket_connect_failure_is_an_unopened_failure() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (sink, inspect) = memory_sink();
    let url = Url::parse(&format!("ws://{}/ws", addr)).unwrap();
    let (mut transport, _outbound) = WebSocketTransport::new(url, sink, Arc::new(SystemClock));

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
    let end = transport.run_session(shutdown_tx.subscribe()).await;

    assert!(matches!(end, SessionEnd::Failed { opened: false, .. }));
    assert!(inspect.lock().unwrap().lines().is_empty());
}

// =============================================================================
// SSE (server-push) transport
// =============================================================================

async fn spawn_sse_server(body: &'static str) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = stream.read(&mut request).await;

        let response = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: text/event-stream\r\n\
             Cache-Control: no-cache\r\n\
             Connection: close\r\n\
             \r\n{}",
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
    });

    addr
}

#[tokio::test]
async fn test_sse_renders_default_events_verbatim() {
    let addr = spawn_sse_server("data: one\n\ndata: two\n\n").await;

    let (sink, inspect) = memory_sink();
    let url = Url::parse(&format!("http://{}/events", addr)).unwrap();
    let mut transport = SseTransport::new(url, sink, Arc::new(SystemClock));

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
    let end = transport.run_session(shutdown_tx.subscribe()).await;

    assert!(matches!(end, SessionEnd::Closed));

    let texts = inspect.lock().unwrap().texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].ends_with(" => one"), "got {:?}", texts[0]);
    assert!(texts[1].ends_with(" => two"), "got {:?}", texts[1]);
}

#[tokio::test]
async fn test_sse_refresh_event_requests_a_reload() {
    // The refresh payload is ignored; only its arrival matters.
    let addr = spawn_sse_server("data: tick\n\nevent: refresh\ndata: whatever\n\n").await;

    let (sink, inspect) = memory_sink();
    let url = Url::parse(&format!("http://{}/events", addr)).unwrap();
    let mut transport = SseTransport::new(url, sink, Arc::new(SystemClock));

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
    let end = transport.run_session(shutdown_tx.subscribe()).await;

    assert!(matches!(end, SessionEnd::Refresh));

    // The line received before the refresh was still rendered.
    let texts = inspect.lock().unwrap().texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].ends_with(" => tick"), "got {:?}", texts[0]);
}

#[tokio::test]
async fn test_sse_unreachable_endpoint_is_an_unopened_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (sink, _inspect) = memory_sink();
    let url = Url::parse(&format!("http://{}/events", addr)).unwrap();
    let mut transport = SseTransport::new(url, sink, Arc::new(SystemClock));

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
    let end = transport.run_session(shutdown_tx.subscribe()).await;

    assert!(matches!(end, SessionEnd::Failed { opened: false, .. }));
}
