//! The monitoring cycle.
//!
//! One cycle is: load registry → lock → load state → sample → parse + enrich
//! → merge → classify → save → notify. State is saved before any message is
//! sent, so a crash mid-delivery can lose a notification but never repeat one.

use std::path::{Path, PathBuf};

use crate::data::{advance, duration::format_age, Thresholds};
use crate::error::MonitorError;
use crate::notify::{DeliveryReport, Notifier, Transport};
use crate::registry::Registry;
use crate::source::{parse_report, ReportSource};
use crate::store::StateStore;

/// Outcome of a single cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No state existed; a blank state file was written and nothing else ran.
    Bootstrapped { state_path: PathBuf },
    Completed(CycleReport),
}

/// What a completed cycle observed and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Peers present in the connectivity report.
    pub peers_seen: usize,
    /// Peers recorded for the first time.
    pub new_peers: Vec<String>,
    /// Reconnected peers that were notified about.
    pub reconnected: Vec<String>,
    /// Reconnected peers with notifications disabled.
    pub suppressed: Vec<String>,
    pub deliveries: DeliveryReport,
}

/// Runs monitoring cycles against one state file.
#[derive(Debug)]
pub struct Monitor {
    registry_path: PathBuf,
    store: StateStore,
    source: Box<dyn ReportSource>,
    transport: Box<dyn Transport>,
    thresholds: Thresholds,
}

impl Monitor {
    pub fn new(
        registry_path: impl Into<PathBuf>,
        store: StateStore,
        source: Box<dyn ReportSource>,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            registry_path: registry_path.into(),
            store,
            source,
            transport,
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run one full cycle.
    ///
    /// Fatal errors abort before anything is saved, except a failed save
    /// itself, which aborts before anything is sent.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, MonitorError> {
        let registry = Registry::load(&self.registry_path)?;
        let lock = self.store.lock()?;
        tracing::debug!(lockfile = %lock.path().display(), "Acquired state lock");

        let loaded = self.store.load()?;
        if loaded.created {
            tracing::warn!(
                path = %self.store.path().display(),
                "No state file found; created a blank one. Add subscribers and run again",
            );
            return Ok(CycleOutcome::Bootstrapped {
                state_path: self.store.path().to_path_buf(),
            });
        }
        let mut state = loaded.state;

        let raw = self.source.sample().await?;
        let readings: Vec<_> = parse_report(&raw)
            .into_iter()
            .map(|reading| registry.enrich(reading))
            .collect();
        tracing::debug!(
            source = %self.source.description(),
            readings = readings.len(),
            "Parsed connectivity report",
        );

        let merge = state.merge(readings);
        for id in &merge.discovered {
            tracing::info!(peer = %id, "Discovered new peer");
        }

        let mut report = CycleReport {
            peers_seen: merge.seen,
            new_peers: merge.discovered,
            ..Default::default()
        };
        let mut to_notify = Vec::new();

        for record in state.peers.values_mut() {
            let step = advance(record, &self.thresholds);
            tracing::debug!(
                peer = %record.label(),
                from = step.transition.from.symbol(),
                to = step.transition.to.symbol(),
                "Classified peer",
            );
            if step.transition.is_reconnection() {
                if step.notify {
                    tracing::info!(
                        peer = %record.label(),
                        age = %format_age(record.current_age_seconds),
                        "Peer reconnected",
                    );
                    report.reconnected.push(record.id.clone());
                    to_notify.push(step.record.clone());
                } else {
                    tracing::debug!(peer = %record.label(), "Peer reconnected; notifications disabled");
                    report.suppressed.push(record.id.clone());
                }
            }
            *record = step.record;
        }

        self.store.save(&state)?;
        drop(lock);

        if !to_notify.is_empty() && state.subscribers.is_empty() {
            tracing::warn!(
                path = %self.store.path().display(),
                "Reconnections detected but no subscribers are configured",
            );
        }
        self.transport.prepare(&state);
        let notifier = Notifier::new(self.transport.as_ref(), &state.subscribers);
        for record in &to_notify {
            report.deliveries.absorb(notifier.notify(record).await);
        }
        if let Err(e) = self.transport.finish().await {
            tracing::warn!(transport = %self.transport.description(), error = %e, "Transport cleanup failed");
        }

        tracing::info!(
            peers = report.peers_seen,
            new = report.new_peers.len(),
            reconnected = report.reconnected.len(),
            suppressed = report.suppressed.len(),
            delivered = report.deliveries.delivered(),
            failed = report.deliveries.failures.len(),
            "Cycle complete",
        );

        Ok(CycleOutcome::Completed(report))
    }
}
