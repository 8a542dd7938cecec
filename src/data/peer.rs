//! Peer records and live readings.
//!
//! A [`LiveReading`] is what one connectivity report says about a peer right
//! now. A [`PeerRecord`] is the durable per-peer history the monitor keeps
//! across cycles. The serialized field names match the state files written by
//! earlier versions of the tool (`pubkey`, `name`, `last_hs`, ...), so those
//! files load unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::duration::format_age;

/// Handshake age meaning "no handshake has ever been observed".
///
/// Larger than any notification threshold, so a peer at `NEVER` is always
/// considered offline.
pub const NEVER: u64 = u64::MAX;

fn never() -> u64 {
    NEVER
}

fn enabled_by_default() -> bool {
    true
}

/// One peer as observed in a single connectivity report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveReading {
    /// Peer public key.
    pub id: String,
    /// Seconds since the latest handshake, or [`NEVER`].
    pub age_seconds: u64,
    /// Endpoint host (port stripped), if the peer has an active endpoint.
    pub endpoint: Option<String>,
    /// Display name resolved from the registry, empty if unresolved.
    pub display_name: String,
    /// Tunnel address resolved from the registry, empty if unresolved.
    pub address: String,
}

impl LiveReading {
    /// Create an unenriched reading.
    pub fn new(id: impl Into<String>, age_seconds: u64, endpoint: Option<String>) -> Self {
        Self {
            id: id.into(),
            age_seconds,
            endpoint,
            display_name: String::new(),
            address: String::new(),
        }
    }
}

/// Durable state for a single peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Peer public key, the natural key of the state store.
    #[serde(rename = "pubkey", default)]
    pub id: String,

    #[serde(rename = "name", default)]
    pub display_name: String,

    #[serde(default)]
    pub address: String,

    /// Observed endpoint hosts, most recently observed last.
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Handshake age recorded at the end of the previous cycle.
    #[serde(rename = "last_hs", default = "never")]
    pub previous_age_seconds: u64,

    /// Handshake age measured this cycle.
    #[serde(rename = "new_hs", default = "never")]
    pub current_age_seconds: u64,

    /// Whether notifications are permitted for this peer.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl PeerRecord {
    /// A record for a peer seen for the first time.
    ///
    /// The baseline starts at [`NEVER`], so a first sighting with a fresh
    /// handshake counts as a reconnection.
    pub fn discovered(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            address: String::new(),
            endpoints: Vec::new(),
            previous_age_seconds: NEVER,
            current_age_seconds: NEVER,
            enabled: true,
        }
    }

    /// Fold a live reading into this record.
    ///
    /// Only the current age, the endpoint list and (when resolved) the
    /// registry identity change. The baseline is left for the transition
    /// detector to roll forward.
    pub fn apply(&mut self, reading: &LiveReading) {
        self.current_age_seconds = reading.age_seconds;
        if let Some(host) = &reading.endpoint {
            self.observe_endpoint(host);
        }
        if !reading.display_name.is_empty() {
            self.display_name.clone_from(&reading.display_name);
        }
        if !reading.address.is_empty() {
            self.address.clone_from(&reading.address);
        }
    }

    /// Record an endpoint host as the most recently observed one.
    ///
    /// Known hosts move to the end instead of being appended twice.
    pub fn observe_endpoint(&mut self, host: &str) {
        if host.is_empty() {
            return;
        }
        if let Some(index) = self.endpoints.iter().position(|known| known == host) {
            let known = self.endpoints.remove(index);
            self.endpoints.push(known);
        } else {
            self.endpoints.push(host.to_string());
        }
    }

    /// The most recently observed endpoint host.
    pub fn current_endpoint(&self) -> Option<&str> {
        self.endpoints.last().map(String::as_str)
    }

    /// Display name, falling back to the public key when unresolved.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }
}

impl fmt::Display for PeerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Peer {}", self.label())?;
        writeln!(f, "- Pubkey: {}", self.id)?;
        writeln!(f, "- Address: {}", self.address)?;
        writeln!(f, "- Endpoints: [{}]", self.endpoints.join(", "))?;
        writeln!(f, "- Last handshake: {}", format_age(self.previous_age_seconds))?;
        write!(f, "- Enabled: {}", self.enabled)
    }
}
