//! Signal delivery through `signal-cli`.
//!
//! Each message is one `signal-cli -u <account> send -m <message> <recipient>`
//! invocation. After a cycle's deliveries the account's inbound queue is
//! drained with `signal-cli -u <account> receive`, which signal-cli expects
//! to be run regularly.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::Transport;
use crate::config::TransportSettings;
use crate::error::MonitorError;
use crate::store::StateFile;

/// Delivers notifications as Signal messages.
///
/// The sending account comes from `transport.account` in the settings. When
/// that is empty, the `account` field of the state file is used, re-read on
/// every cycle through [`Transport::prepare`].
#[derive(Debug, Clone)]
pub struct SignalCliTransport {
    program: String,
    configured_account: String,
    account: String,
    timeout: Duration,
    receive_after_send: bool,
    description: String,
}

impl SignalCliTransport {
    pub fn new(program: impl Into<String>, account: impl Into<String>, timeout: Duration) -> Self {
        let program = program.into();
        let account = account.into();
        let description = describe(&account);
        Self {
            program,
            configured_account: account.clone(),
            account,
            timeout,
            receive_after_send: true,
            description,
        }
    }

    pub fn from_settings(settings: &TransportSettings) -> Self {
        Self::new(
            settings.program.clone(),
            settings.account.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
        .with_receive_after_send(settings.receive_after_send)
    }

    /// Whether to drain the inbound queue in [`Transport::finish`].
    pub fn with_receive_after_send(mut self, enabled: bool) -> Self {
        self.receive_after_send = enabled;
        self
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Adopt the state file's account unless one is configured.
    fn use_state_account(&mut self, state_account: &str) {
        if !self.configured_account.is_empty() || self.account == state_account {
            return;
        }
        self.account = state_account.to_string();
        self.description = describe(&self.account);
        tracing::debug!(account = %self.account, "Using sending account from state file");
    }

    fn send_args<'a>(&'a self, message: &'a str, recipient: &'a str) -> [&'a str; 6] {
        ["-u", self.account.as_str(), "send", "-m", message, recipient]
    }

    async fn run(&self, args: &[&str], what: &str) -> Result<String, MonitorError> {
        if self.account.is_empty() {
            return Err(MonitorError::Transport(
                "no signal account configured".to_string(),
            ));
        }

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program).args(args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| MonitorError::Transport(format!("{} {} timed out", self.program, what)))?
        .map_err(|e| MonitorError::Transport(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MonitorError::Transport(format!(
                "{} {} exited with {}: {}",
                self.program,
                what,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn describe(account: &str) -> String {
    if account.is_empty() {
        "signal-cli: account from state".to_string()
    } else {
        format!("signal-cli: {}", account)
    }
}

#[async_trait]
impl Transport for SignalCliTransport {
    async fn send(&self, message: &str, recipient: &str) -> Result<(), MonitorError> {
        let stdout = self.run(&self.send_args(message, recipient), "send").await?;
        tracing::debug!(recipient = %recipient, output = %stdout.trim(), "signal-cli send finished");
        Ok(())
    }

    fn prepare(&mut self, state: &StateFile) {
        self.use_state_account(&state.account);
    }

    async fn finish(&self) -> Result<(), MonitorError> {
        if !self.receive_after_send {
            return Ok(());
        }
        let stdout = self.run(&["-u", self.account.as_str(), "receive"], "receive").await?;
        tracing::debug!(bytes = stdout.len(), "Drained signal-cli inbound queue");
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TransportSettings {
        TransportSettings {
            program: "signal-cli".into(),
            account: String::new(),
            timeout_secs: 5,
            receive_after_send: false,
        }
    }

    #[test]
    fn test_send_args() {
        let transport = SignalCliTransport::new("signal-cli", "+15550100", Duration::from_secs(1));
        assert_eq!(
            transport.send_args("hello", "+15550101"),
            ["-u", "+15550100", "send", "-m", "hello", "+15550101"]
        );
    }

    fn state_with_account(account: &str) -> StateFile {
        StateFile {
            account: account.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_account_falls_back_to_state() {
        let mut transport = SignalCliTransport::from_settings(&settings());
        assert_eq!(transport.account(), "");

        transport.prepare(&state_with_account("+15550100"));
        assert_eq!(transport.account(), "+15550100");
        assert_eq!(transport.description(), "signal-cli: +15550100");

        // A later edit of the state file is picked up on the next cycle
        transport.prepare(&state_with_account("+15550111"));
        assert_eq!(transport.account(), "+15550111");
    }

    #[test]
    fn test_configured_account_wins_over_state() {
        let mut configured = settings();
        configured.account = "+15550199".into();
        let mut transport = SignalCliTransport::from_settings(&configured);

        transport.prepare(&state_with_account("+15550100"));
        assert_eq!(transport.account(), "+15550199");
    }

    #[tokio::test]
    async fn test_missing_account_is_transport_error() {
        let mut transport = SignalCliTransport::from_settings(&settings());
        transport.prepare(&StateFile::default());
        let err = transport.send("hi", "+15550101").await.unwrap_err();
        assert!(matches!(err, MonitorError::Transport(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_finish_skipped_when_disabled() {
        let transport = SignalCliTransport::from_settings(&settings());
        assert!(transport.finish().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program_is_transport_error() {
        let transport =
            SignalCliTransport::new("/nonexistent/signal-cli", "+15550100", Duration::from_secs(5));
        let err = transport.send("hi", "+15550101").await.unwrap_err();
        assert!(matches!(err, MonitorError::Transport(_)));
    }
}
