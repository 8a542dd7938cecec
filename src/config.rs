//! Layered settings.
//!
//! Resolution order: built-in defaults → TOML file → `PEERWATCH_*`
//! environment variables → command-line flags (applied by the binary).
//!
//! ```toml
//! [paths]
//! registry = "/etc/wireguard/clients/network_data.json"
//! state = "/etc/wireguard/clients/tv_data.json"
//!
//! [sampler]
//! program = "wg"
//! interface = "wg0"
//!
//! [transport]
//! account = "+15550100"
//!
//! [thresholds]
//! stale_secs = 300
//! fresh_secs = 120
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `PEERWATCH_PATHS__STATE=/var/lib/peerwatch/state.json`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::{Thresholds, NEVER};
use crate::error::MonitorError;

/// Config file read when none is given explicitly.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/peerwatch/config.toml";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub sampler: SamplerSettings,
    pub transport: TransportSettings,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Client registry written by the network generator.
    pub registry: PathBuf,
    /// Durable peer state.
    pub state: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("/etc/wireguard/clients/network_data.json"),
            state: PathBuf::from("/etc/wireguard/clients/tv_data.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    pub program: String,
    /// Interface to report on. Empty = all interfaces.
    pub interface: String,
    pub timeout_secs: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            program: "wg".to_string(),
            interface: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub program: String,
    /// Sending account. Empty = use the state file's `account`.
    pub account: String,
    pub timeout_secs: u64,
    /// Drain the account's inbound queue after each cycle.
    pub receive_after_send: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            program: "signal-cli".to_string(),
            account: String::new(),
            timeout_secs: 30,
            receive_after_send: true,
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicitly given file must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(required))
            .add_source(
                // Values stay strings; serde converts numeric fields. Parsing
                // here would turn an account like "+15550100" into an integer.
                Environment::with_prefix("PEERWATCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check that the settings are internally consistent.
    pub fn validate(&self) -> Result<(), MonitorError> {
        let Thresholds {
            stale_secs,
            fresh_secs,
        } = self.thresholds;
        if fresh_secs >= stale_secs {
            return Err(MonitorError::Config(format!(
                "thresholds.fresh_secs ({}) must be below thresholds.stale_secs ({})",
                fresh_secs, stale_secs
            )));
        }
        if stale_secs >= NEVER {
            return Err(MonitorError::Config(
                "thresholds.stale_secs is out of range".to_string(),
            ));
        }
        if self.sampler.timeout_secs == 0 || self.transport.timeout_secs == 0 {
            return Err(MonitorError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.thresholds, Thresholds::default());
        assert_eq!(settings.sampler.program, "wg");
        assert_eq!(settings.transport.program, "signal-cli");
        assert!(settings.transport.receive_after_send);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [sampler]
            interface = "wg0"

            [thresholds]
            stale_secs = 600
            "#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.sampler.interface, "wg0");
        assert_eq!(settings.sampler.program, "wg");
        assert_eq!(settings.thresholds.stale_secs, 600);
        assert_eq!(settings.thresholds.fresh_secs, 120);
        assert_eq!(settings.paths, PathSettings::default());
    }

    #[test]
    fn test_env_overrides_keep_account_verbatim() {
        std::env::set_var("PEERWATCH_TRANSPORT__ACCOUNT", "+15550100");
        std::env::set_var("PEERWATCH_TRANSPORT__TIMEOUT_SECS", "45");
        let settings = Settings::load(None);
        std::env::remove_var("PEERWATCH_TRANSPORT__ACCOUNT");
        std::env::remove_var("PEERWATCH_TRANSPORT__TIMEOUT_SECS");

        let settings = settings.unwrap();
        assert_eq!(settings.transport.account, "+15550100");
        assert_eq!(settings.transport.timeout_secs, 45);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let err = Settings::load(Some(Path::new("/nonexistent/peerwatch.toml"))).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut settings = Settings::default();
        settings.thresholds.fresh_secs = 300;
        assert!(matches!(settings.validate(), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[[ not toml").unwrap();
        // No extension: the format cannot be inferred either way
        assert!(Settings::load(Some(file.path())).is_err());
    }
}
