//! # peerwatch
//!
//! A WireGuard peer monitor that sends a notification exactly once each time
//! a peer comes back online.
//!
//! Every invocation runs one cycle: it samples the current `wg show` report,
//! compares each peer's latest handshake against the age recorded by the
//! previous cycle, and notifies subscribers about peers that went from stale
//! to fresh. Peers that stay connected are never reported twice.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Monitor                              │
//! │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   ┌────────────┐  │
//! │  │ source  │──▶│  report  │──▶│   registry   │──▶│   store    │  │
//! │  │ (text)  │   │ (parse)  │   │  (enrich)    │   │  (merge)   │  │
//! │  └─────────┘   └──────────┘   └──────────────┘   └─────┬──────┘  │
//! │                                                        ▼         │
//! │                 ┌──────────┐   ┌──────────────┐   ┌────────────┐ │
//! │                 │  notify  │◀──│  store.save  │◀──│ transition │ │
//! │                 │(transport)   │  (atomic)    │   │ (classify) │ │
//! │                 └──────────┘   └──────────────┘   └────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: [`ReportSource`] trait with [`CommandSource`] (`wg show`) and
//!   [`FileSource`], plus the report parser
//! - **[`data`]**: [`PeerRecord`], handshake age parsing, and the reconnection detector
//! - **[`registry`]**: Read-only lookup of peer names and addresses
//! - **[`store`]**: Locked, atomically replaced JSON state
//! - **[`notify`]**: [`Transport`] trait, the [`Notifier`], and the `signal-cli` transport
//! - **[`monitor`]**: The cycle tying it all together
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # One cycle with the default paths under /etc/wireguard/clients
//! peerwatch
//!
//! # Every 60 seconds, without sending anything
//! peerwatch --watch 60 --dry-run
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use peerwatch::{CycleOutcome, DryRunTransport, FileSource, Monitor, StateStore};
//!
//! # tokio_test::block_on(async {
//! let mut monitor = Monitor::new(
//!     "network_data.json",
//!     StateStore::new("tv_data.json"),
//!     Box::new(FileSource::new("wg-show.txt")),
//!     Box::new(DryRunTransport),
//! );
//!
//! if let CycleOutcome::Completed(report) = monitor.run_cycle().await? {
//!     println!("{} peers reconnected", report.reconnected.len());
//! }
//! # Ok::<_, peerwatch::MonitorError>(())
//! # });
//! ```
//!
//! ### Parsing a report
//!
//! ```
//! use peerwatch::parse_report;
//!
//! let readings = parse_report("peer: abc=\n  latest handshake: 1 minute, 5 seconds ago\n");
//! assert_eq!(readings[0].age_seconds, 65);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod registry;
pub mod source;
pub mod store;

// Re-export main types for convenience
pub use config::Settings;
pub use data::{LiveReading, PeerRecord, PeerState, Thresholds, Transition, NEVER};
pub use error::MonitorError;
pub use monitor::{CycleOutcome, CycleReport, Monitor};
pub use notify::{DeliveryReport, DryRunTransport, Notifier, SignalCliTransport, Transport};
pub use registry::Registry;
pub use source::{parse_report, CommandSource, FileSource, ReportSource};
pub use store::{StateFile, StateStore};
