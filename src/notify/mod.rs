//! Reconnection notifications.
//!
//! The [`Notifier`] composes one message per reconnected peer and hands it to
//! a [`Transport`] once per subscriber. A failed delivery is recorded in the
//! [`DeliveryReport`] and the remaining subscribers are still tried.

mod dry_run;
mod signal;

pub use dry_run::DryRunTransport;
pub use signal::SignalCliTransport;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::data::PeerRecord;
use crate::error::MonitorError;
use crate::store::StateFile;

/// Capability for delivering a message to one recipient.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Deliver `message` to `recipient`.
    async fn send(&self, message: &str, recipient: &str) -> Result<(), MonitorError>;

    /// Called once per completed cycle, before any delivery, with the state
    /// that was just saved.
    fn prepare(&mut self, _state: &StateFile) {}

    /// Called once after all deliveries of a cycle.
    async fn finish(&self) -> Result<(), MonitorError> {
        Ok(())
    }

    /// Returns a human-readable description of the transport.
    fn description(&self) -> &str;
}

/// A delivery that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub peer: String,
    pub recipient: String,
    pub error: String,
}

/// Outcome of delivering notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Number of (peer, subscriber) deliveries attempted.
    pub attempted: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.attempted - self.failures.len()
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: DeliveryReport) {
        self.attempted += other.attempted;
        self.failures.extend(other.failures);
    }
}

/// Compose the notification text for a reconnected peer.
pub fn compose_message(record: &PeerRecord) -> String {
    let address = if record.address.is_empty() {
        "unknown address"
    } else {
        &record.address
    };
    format!(
        "Notification: Client {} has connected at {} from [{}].",
        record.label(),
        address,
        record.current_endpoint().unwrap_or("unknown")
    )
}

/// Delivers reconnection messages to every subscriber.
#[derive(Debug)]
pub struct Notifier<'a> {
    transport: &'a dyn Transport,
    subscribers: &'a [String],
}

impl<'a> Notifier<'a> {
    pub fn new(transport: &'a dyn Transport, subscribers: &'a [String]) -> Self {
        Self {
            transport,
            subscribers,
        }
    }

    /// Notify all subscribers that `record` reconnected.
    ///
    /// Subscribers are tried in order; a failure is logged and recorded,
    /// never returned.
    pub async fn notify(&self, record: &PeerRecord) -> DeliveryReport {
        let message = compose_message(record);
        let mut report = DeliveryReport::default();

        for recipient in self.subscribers {
            report.attempted += 1;
            tracing::debug!(peer = %record.label(), recipient = %recipient, "Sending notification");

            if let Err(e) = self.transport.send(&message, recipient).await {
                tracing::warn!(
                    peer = %record.label(),
                    recipient = %recipient,
                    transport = %self.transport.description(),
                    error = %e,
                    "Notification delivery failed",
                );
                report.failures.push(DeliveryFailure {
                    peer: record.id.clone(),
                    recipient: recipient.clone(),
                    error: e.to_string(),
                });
            }
        }

        report
    }
}
