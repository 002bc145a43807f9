//! Append-only rendering of received notifications.
//!
//! The browser original appended one `<p>` per received event to a container
//! element. Here the container is a [`LineSink`]: an append-only, ordered
//! sequence of rendered lines that grows for the life of the client.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::Utc;

/// Source of receipt timestamps, in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock pinned to one instant. Handy for tests that assert exact line
/// text.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// One rendered notification line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Client receipt time in epoch milliseconds
    pub received_at_ms: i64,
    /// Full line text, timestamp prefix included
    pub text: String,
}

impl RenderedLine {
    /// Duplex-variant format: timestamp, two spaces, envelope message.
    pub fn for_message(received_at_ms: i64, message: &str) -> Self {
        Self {
            received_at_ms,
            text: format!("{}  {}", received_at_ms, message),
        }
    }

    /// Server-push-variant format: timestamp, arrow, verbatim event data.
    pub fn for_event(received_at_ms: i64, data: &str) -> Self {
        Self {
            received_at_ms,
            text: format!("{} => {}", received_at_ms, data),
        }
    }
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Append-only sink for rendered lines.
///
/// Implementations must preserve append order: the rendered sequence equals
/// the arrival order of the events that produced it.
pub trait LineSink: Send {
    fn append(&mut self, line: RenderedLine);
}

/// Sink shared between the transport and its owner.
pub type SharedSink = Arc<Mutex<dyn LineSink>>;

/// Writes each appended line to the wrapped writer.
pub struct WriterSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> LineSink for WriterSink<W> {
    fn append(&mut self, line: RenderedLine) {
        if let Err(e) = writeln!(self.writer, "{}", line.text) {
            tracing::warn!(error = %e, "Failed to write rendered line");
        }
    }
}

/// In-memory sink exposing the rendered sequence. Used by tests and by
/// embedders that want to inspect lines rather than stream them.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Vec<RenderedLine>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered lines in append order.
    pub fn lines(&self) -> &[RenderedLine] {
        &self.lines
    }

    /// Line texts in append order.
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.text.clone()).collect()
    }
}

impl LineSink for MemorySink {
    fn append(&mut self, line: RenderedLine) {
        self.lines.push(line);
    }
}
