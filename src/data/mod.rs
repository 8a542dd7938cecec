//! Peer data models and reconnection classification.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing of `wg` handshake ages ("1 minute, 5 seconds ago") and formatting
//! - [`peer`]: Durable [`PeerRecord`]s and per-report [`LiveReading`]s
//! - [`transition`]: [`Thresholds`] and the reconnection detector
//!
//! ## Data Flow
//!
//! ```text
//! LiveReading (parsed + registry-enriched)
//!        │
//!        ▼
//! StateFile::merge()  ──▶ PeerRecord.current_age_seconds updated
//!        │
//!        ▼
//! transition::advance() ──▶ Advance { record (baseline rolled), notify }
//! ```

pub mod duration;
pub mod peer;
pub mod transition;

pub use peer::{LiveReading, PeerRecord, NEVER};
pub use transition::{advance, Advance, PeerState, Thresholds, Transition};
