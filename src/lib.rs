// Infrastructure layer (shared components)
pub mod backoff;
pub mod config;
pub mod error;
pub mod telemetry;

// Domain layer
pub mod connection;
pub mod endpoint;
pub mod notification;
pub mod render;

// Transport layer
pub mod sse;
pub mod websocket;

// Application layer
pub mod client;
pub mod shutdown;
