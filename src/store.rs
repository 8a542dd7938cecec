//! Durable peer state.
//!
//! The state file is a JSON object:
//!
//! ```json
//! {
//!     "account": "+15550100",
//!     "peers": { "<pubkey>": { "pubkey": "...", "name": "...", "last_hs": 12, ... } },
//!     "subscribers": ["+15550101"]
//! }
//! ```
//!
//! A cycle holds [`StoreLock`] from load to save. Saves go to a temporary
//! file in the same directory which is then renamed over the state file, so
//! readers only ever see a complete file.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::data::{LiveReading, PeerRecord, NEVER};
use crate::error::MonitorError;

/// Peer records keyed by public key.
pub type PeerTable = BTreeMap<String, PeerRecord>;

/// Contents of the state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    /// Sending account for the transport. Not used by the monitor itself.
    #[serde(default)]
    pub account: String,

    #[serde(default)]
    pub peers: PeerTable,

    /// Notification recipients, in delivery order.
    #[serde(default)]
    pub subscribers: Vec<String>,

    /// Fields written by other tools, preserved on save.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// What [`StateFile::merge`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Peers present in the report.
    pub seen: usize,
    /// Ids of peers created this cycle.
    pub discovered: Vec<String>,
    /// Known peers missing from the report.
    pub absent: usize,
}

impl StateFile {
    /// Reconcile live readings with the stored records.
    ///
    /// Unknown ids get a fresh record with a [`NEVER`] baseline. Known peers
    /// missing from the report have no handshake this cycle and their current
    /// age becomes [`NEVER`]. Records are never removed.
    pub fn merge(&mut self, readings: Vec<LiveReading>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        let mut seen = HashSet::new();

        for reading in readings {
            let record = self.peers.entry(reading.id.clone()).or_insert_with(|| {
                summary.discovered.push(reading.id.clone());
                PeerRecord::discovered(reading.id.clone())
            });
            record.apply(&reading);
            seen.insert(reading.id);
        }

        for (id, record) in self.peers.iter_mut() {
            if !seen.contains(id) {
                record.current_age_seconds = NEVER;
                summary.absent += 1;
            }
        }

        summary.seen = seen.len();
        summary
    }

    /// Make every record's id agree with its map key.
    fn normalize(&mut self) {
        for (id, record) in self.peers.iter_mut() {
            if record.id != *id {
                record.id.clone_from(id);
            }
        }
    }
}

/// Result of [`StateStore::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub state: StateFile,
    /// The state file did not exist and a blank one was written.
    pub created: bool,
}

/// Exclusive advisory lock on the state file, released on drop.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Path of the lockfile.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Handle on the durable state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the state file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lockfile guarding this store.
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Take the single-writer lock, failing fast if another cycle holds it.
    pub fn lock(&self) -> Result<StoreLock, MonitorError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| MonitorError::StateWrite(format!("{}: {}", parent.display(), e)))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| MonitorError::StateWrite(format!("{}: {}", lock_path.display(), e)))?;
        file.try_lock_exclusive()
            .map_err(|_| MonitorError::Locked(lock_path.clone()))?;
        Ok(StoreLock {
            _file: file,
            path: lock_path,
        })
    }

    /// Load the stored state.
    ///
    /// On first run the file does not exist: a blank one is written so the
    /// operator can fill in subscribers, and `created` is set.
    pub fn load(&self) -> Result<Loaded, MonitorError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let mut state: StateFile = serde_json::from_str(&content)
                    .map_err(|e| MonitorError::StateRead(format!("{}: {}", self.path.display(), e)))?;
                state.normalize();
                Ok(Loaded {
                    state,
                    created: false,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let state = StateFile::default();
                self.save(&state)?;
                Ok(Loaded {
                    state,
                    created: true,
                })
            }
            Err(e) => Err(MonitorError::StateRead(format!(
                "read error on {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Read the stored state without creating it. `None` if there is none yet.
    pub fn peek(&self) -> Result<Option<StateFile>, MonitorError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content)
                .map(|mut state: StateFile| {
                    state.normalize();
                    Some(state)
                })
                .map_err(|e| MonitorError::StateRead(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MonitorError::StateRead(format!(
                "read error on {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Atomically replace the state file with `state`.
    pub fn save(&self, state: &StateFile) -> Result<(), MonitorError> {
        let write_err = |e: std::io::Error| {
            MonitorError::StateWrite(format!("{}: {}", self.path.display(), e))
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| MonitorError::StateWrite(format!("serialize: {}", e)))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        // Temp files are created owner-only; keep the mode of the file being replaced
        if let Ok(existing) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        tracing::debug!(path = %self.path.display(), peers = state.peers.len(), "State saved");
        Ok(())
    }
}
