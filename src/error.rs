//! Error types for a monitoring cycle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running a monitoring cycle.
///
/// Everything except [`MonitorError::Transport`] aborts the cycle it occurs
/// in. Delivery failures are collected per subscriber instead of propagated,
/// see [`DeliveryReport`](crate::notify::DeliveryReport).
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The registry file does not exist.
    #[error("registry file not found: {}", .0.display())]
    RegistryMissing(PathBuf),

    /// The registry file exists but could not be read or parsed.
    #[error("failed to load registry: {0}")]
    Registry(String),

    /// The state file could not be read or parsed.
    #[error("failed to read state: {0}")]
    StateRead(String),

    /// The state file could not be written atomically.
    #[error("failed to persist state: {0}")]
    StateWrite(String),

    /// Another cycle holds the state lock.
    #[error("state is locked by another cycle (lockfile: {})", .0.display())]
    Locked(PathBuf),

    /// The connectivity report could not be sampled.
    #[error("failed to sample connectivity report: {0}")]
    Sample(String),

    /// A message could not be delivered to a subscriber.
    #[error("delivery failed: {0}")]
    Transport(String),

    /// An external command did not finish in time.
    #[error("{0} timed out")]
    Timeout(String),

    /// Settings could not be loaded or are inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MonitorError {
    /// Whether this error aborts the whole cycle.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MonitorError::Transport(_))
    }
}

impl From<config::ConfigError> for MonitorError {
    fn from(err: config::ConfigError) -> Self {
        MonitorError::Config(err.to_string())
    }
}
