//! Reconnection detection.
//!
//! Each cycle a peer is classified twice: once by its baseline (the age
//! recorded at the end of the previous cycle) and once by the fresh reading.
//! A reconnection is the move from [`PeerState::Offline`] to
//! [`PeerState::OnlineRecent`]. Because the baseline is rolled forward every
//! cycle, a peer that stays connected never fires a second time.

use serde::{Deserialize, Serialize};

use super::peer::PeerRecord;

/// Thresholds for classifying handshake ages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Ages strictly above this many seconds are offline.
    pub stale_secs: u64,
    /// Ages at or below this many seconds are freshly connected.
    pub fresh_secs: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stale_secs: 300,
            fresh_secs: 120,
        }
    }
}

impl Thresholds {
    /// Classify a handshake age.
    pub fn classify(&self, age_secs: u64) -> PeerState {
        if age_secs > self.stale_secs {
            PeerState::Offline
        } else if age_secs <= self.fresh_secs {
            PeerState::OnlineRecent
        } else {
            PeerState::Indeterminate
        }
    }
}

/// Connectivity state derived from a handshake age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Offline,
    OnlineRecent,
    Indeterminate,
}

impl PeerState {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            PeerState::Offline => "OFF",
            PeerState::OnlineRecent => "ON",
            PeerState::Indeterminate => "IDLE",
        }
    }
}

/// A peer's state at the start of the cycle and by its fresh reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PeerState,
    pub to: PeerState,
}

impl Transition {
    /// Whether this transition is a notification-worthy reconnection.
    pub fn is_reconnection(&self) -> bool {
        self.from == PeerState::Offline && self.to == PeerState::OnlineRecent
    }
}

/// Outcome of advancing one peer by one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// The record with its baseline rolled forward to the current reading.
    pub record: PeerRecord,
    pub transition: Transition,
    /// Reconnection on an enabled peer.
    pub notify: bool,
}

/// Classify a peer's transition and roll its baseline forward.
///
/// `enabled = false` only clears `notify`; the transition and the baseline
/// update are the same as for an enabled peer.
pub fn advance(record: &PeerRecord, thresholds: &Thresholds) -> Advance {
    let transition = Transition {
        from: thresholds.classify(record.previous_age_seconds),
        to: thresholds.classify(record.current_age_seconds),
    };

    let mut next = record.clone();
    next.previous_age_seconds = record.current_age_seconds;

    Advance {
        notify: transition.is_reconnection() && record.enabled,
        record: next,
        transition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::peer::NEVER;

    fn record(previous: u64, current: u64) -> PeerRecord {
        let mut record = PeerRecord::discovered("peer=");
        record.previous_age_seconds = previous;
        record.current_age_seconds = current;
        record
    }

    /// Run successive cycles, returning how many notified.
    fn run_cycles(mut peer: PeerRecord, readings: &[u64]) -> (PeerRecord, usize) {
        let thresholds = Thresholds::default();
        let mut fired = 0;
        for &age in readings {
            peer.current_age_seconds = age;
            let step = advance(&peer, &thresholds);
            if step.notify {
                fired += 1;
            }
            peer = step.record;
        }
        (peer, fired)
    }

    #[test]
    fn test_classify_boundaries() {
        let t = Thresholds::default();
        assert_eq!(t.classify(301), PeerState::Offline);
        assert_eq!(t.classify(300), PeerState::Indeterminate);
        assert_eq!(t.classify(121), PeerState::Indeterminate);
        assert_eq!(t.classify(120), PeerState::OnlineRecent);
        assert_eq!(t.classify(0), PeerState::OnlineRecent);
        assert_eq!(t.classify(NEVER), PeerState::Offline);
    }

    #[test]
    fn test_continuous_connectivity_never_fires() {
        let (peer, fired) = run_cycles(record(50, 50), &[40, 30, 20]);
        assert_eq!(fired, 0);
        assert_eq!(peer.previous_age_seconds, 20);
    }

    #[test]
    fn test_reconnection_fires_once() {
        let (peer, fired) = run_cycles(record(301, 301), &[10]);
        assert_eq!(fired, 1);
        assert_eq!(peer.previous_age_seconds, 10);

        let (_, fired_again) = run_cycles(peer, &[15]);
        assert_eq!(fired_again, 0);
    }

    #[test]
    fn test_first_sighting_fires() {
        let mut peer = PeerRecord::discovered("new=");
        peer.current_age_seconds = 5;
        let step = advance(&peer, &Thresholds::default());
        assert!(step.transition.is_reconnection());
        assert!(step.notify);
    }

    #[test]
    fn test_disabled_suppresses_but_still_tracks() {
        let mut peer = record(301, 10);
        peer.enabled = false;

        let step = advance(&peer, &Thresholds::default());
        assert!(step.transition.is_reconnection());
        assert!(!step.notify);
        assert_eq!(step.record.previous_age_seconds, 10);
        assert!(!step.record.enabled);
    }

    #[test]
    fn indeterminate_baseline_does_not_fire() {
        let step = advance(&record(200, 5), &Thresholds::default());
        assert_eq!(step.transition.from, PeerState::Indeterminate);
        assert!(!step.notify);
    }

    #[test]
    fn stale_to_stale_does_not_fire() {
        let step = advance(&record(NEVER, NEVER), &Thresholds::default());
        assert!(!step.notify);
        assert_eq!(step.record.previous_age_seconds, NEVER);
    }

    #[test]
    fn drop_out_and_return_fires_again() {
        let (_, fired) = run_cycles(record(NEVER, NEVER), &[5, 60, 400, 900, 3]);
        assert_eq!(fired, 2);
    }

    #[test]
    fn custom_thresholds_apply() {
        let t = Thresholds {
            stale_secs: 60,
            fresh_secs: 30,
        };
        let step = advance(&record(61, 30), &t);
        assert!(step.notify);
    }
}
