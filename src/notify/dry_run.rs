use async_trait::async_trait;

use super::Transport;
use crate::error::MonitorError;

/// A transport that only logs what it would send.
#[derive(Debug, Clone, Default)]
pub struct DryRunTransport;

#[async_trait]
impl Transport for DryRunTransport {
    async fn send(&self, message: &str, recipient: &str) -> Result<(), MonitorError> {
        tracing::info!(recipient = %recipient, message = %message, "Dry run: not sending");
        Ok(())
    }

    fn description(&self) -> &str {
        "dry-run"
    }
}
