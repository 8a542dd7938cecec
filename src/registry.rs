//! Read-only client registry.
//!
//! The registry is the `network_data.json` file maintained by the network
//! generator. Only the `clients` list is read, and of each client only the
//! fields needed to label a peer. Private keys are never deserialized.

use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use crate::data::LiveReading;
use crate::error::MonitorError;

/// One client entry of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub address: String,
    /// Site-to-site subnet routed through this client, if any.
    #[serde(default)]
    pub subnet: String,
}

/// The client registry, mapping public keys to names and addresses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registry {
    #[serde(default)]
    clients: Vec<ClientEntry>,
}

impl Registry {
    /// Load the registry from disk.
    ///
    /// A missing file is [`MonitorError::RegistryMissing`]; an empty file is
    /// an empty registry.
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MonitorError::RegistryMissing(path.to_path_buf()),
            _ => MonitorError::Registry(format!("read error on {}: {}", path.display(), e)),
        })?;
        Self::parse(&content)
            .map_err(|e| MonitorError::Registry(format!("{}: {}", path.display(), e)))
    }

    /// Parse a registry from JSON.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(content)
    }

    /// Number of clients in the registry.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// The entry whose public key matches `id`.
    pub fn entry(&self, id: &str) -> Option<&ClientEntry> {
        self.clients.iter().find(|client| client.public_key == id)
    }

    /// Resolve a peer to `(display_name, address)`, empty when unmatched.
    pub fn lookup(&self, id: &str) -> (&str, &str) {
        self.entry(id)
            .map_or(("", ""), |client| (client.name.as_str(), client.address.as_str()))
    }

    /// Attach the registry identity to a live reading.
    pub fn enrich(&self, mut reading: LiveReading) -> LiveReading {
        let (name, address) = self.lookup(&reading.id);
        reading.display_name = name.to_string();
        reading.address = address.to_string();
        reading
    }
}
