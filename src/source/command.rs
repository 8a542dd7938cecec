//! Command-based report source.
//!
//! Runs `wg show [interface]` and captures its stdout.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::ReportSource;
use crate::config::SamplerSettings;
use crate::error::MonitorError;

/// A report source that runs the WireGuard CLI.
#[derive(Debug)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    description: String,
}

impl CommandSource {
    /// Create a source running `<program> show [interface]`.
    pub fn new(program: impl Into<String>, interface: Option<&str>, timeout: Duration) -> Self {
        let program = program.into();
        let mut args = vec!["show".to_string()];
        if let Some(interface) = interface.filter(|i| !i.is_empty()) {
            args.push(interface.to_string());
        }
        let description = format!("command: {} {}", program, args.join(" "));
        Self {
            program,
            args,
            timeout,
            description,
        }
    }

    /// Create a source from sampler settings.
    pub fn from_settings(settings: &SamplerSettings) -> Self {
        Self::new(
            settings.program.clone(),
            Some(settings.interface.as_str()),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Arguments passed to the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl ReportSource for CommandSource {
    async fn sample(&mut self) -> Result<String, MonitorError> {
        tracing::debug!(source = %self.description, "Sampling connectivity report");

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program).args(&self.args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| MonitorError::Timeout(self.description.clone()))?
        .map_err(|e| MonitorError::Sample(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MonitorError::Sample(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_without_interface() {
        let source = CommandSource::new("wg", None, Duration::from_secs(1));
        assert_eq!(source.args(), ["show"]);
        assert_eq!(source.description(), "command: wg show");
    }

    #[test]
    fn test_args_with_interface() {
        let source = CommandSource::new("wg", Some("wg0"), Duration::from_secs(1));
        assert_eq!(source.args(), ["show", "wg0"]);
    }

    #[test]
    fn empty_interface_means_all() {
        let source = CommandSource::new("wg", Some(""), Duration::from_secs(1));
        assert_eq!(source.args(), ["show"]);
    }

    #[tokio::test]
    async fn missing_program_is_sample_error() {
        let mut source = CommandSource::new(
            "/nonexistent/peerwatch-test-wg",
            None,
            Duration::from_secs(5),
        );
        let err = source.sample().await.unwrap_err();
        assert!(matches!(err, MonitorError::Sample(_)));
    }
}
