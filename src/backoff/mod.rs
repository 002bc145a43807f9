//! Exponential backoff for transport reconnection

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Backoff tuning, loadable from the `reconnect` configuration table.
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier for exponential growth
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
    /// Reconnect attempts allowed before the client gives up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    30_000 // 30 seconds
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter_factor() -> f64 {
    0.1 // 10% jitter
}

fn default_max_attempts() -> u32 {
    10
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter_factor: default_jitter_factor(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Exponential backoff with jitter and a retry ceiling.
///
/// Unlike a bare reconnect-in-the-error-handler loop, the ceiling guarantees
/// a persistently unreachable endpoint is eventually surfaced to the caller
/// instead of being hammered forever.
#[derive(Debug)]
pub struct ReconnectBackoff {
    config: BackoffConfig,
    next_base_ms: f64,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        let next_base_ms = config.initial_delay_ms as f64;
        Self {
            config,
            next_base_ms,
            attempt: 0,
        }
    }

    /// Delay to wait before the next reconnect attempt, or `None` once the
    /// retry budget is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }
        self.attempt += 1;

        let base = self.next_base_ms.min(self.config.max_delay_ms as f64);
        self.next_base_ms =
            (self.next_base_ms * self.config.multiplier).min(self.config.max_delay_ms as f64);

        let delay_ms = if self.config.jitter_factor > 0.0 {
            let spread = base * self.config.jitter_factor;
            let jitter = rand::rng().random_range(-spread..=spread);
            (base + jitter).max(1.0)
        } else {
            base.max(1.0)
        };

        Some(Duration::from_millis(delay_ms as u64))
    }

    /// Reset the budget after a successful establishment.
    pub fn reset(&mut self) {
        self.next_base_ms = self.config.initial_delay_ms as f64;
        self.attempt = 0;
    }

    /// Reconnect attempts spent since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
