mod client;

pub use client::WebSocketTransport;
