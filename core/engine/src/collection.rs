//! Labelled sample collection session.
//!
//! At most one session is active at a time. The session only decides whether a
//! frame should be uploaded; issuing the upload is up to the caller.

use serde::{Deserialize, Serialize};

use crate::types::{CountsSnapshot, Label};

/// Default per-label sample cap.
pub const DEFAULT_QUOTA: u32 = 100;

/// How the quota applies to a session that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPolicy {
    /// Keep recording past the quota; only new sessions are gated, on the cached counts.
    Advisory,
    /// Refuse records once cached count plus session samples reach the quota.
    #[default]
    SelfLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Collecting { label: Label, sample_count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The frame should be uploaded under `label`; `sample_count` includes it.
    Recorded { label: Label, sample_count: u32 },
    QuotaReached { label: Label, sample_count: u32 },
    Idle,
}

/// Tracks the active label and how many samples it has taken.
///
/// With [`QuotaPolicy::SelfLimit`], `record` refuses once the cached count plus
/// the session's samples reaches the quota.
#[derive(Debug, Clone)]
pub struct CollectionSession {
    state: SessionState,
    quota: u32,
    policy: QuotaPolicy,
}

impl CollectionSession {
    pub fn new(quota: u32, policy: QuotaPolicy) -> Self {
        Self {
            state: SessionState::Idle,
            quota,
            policy,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Collecting { .. })
    }

    pub fn label(&self) -> Option<Label> {
        match self.state {
            SessionState::Collecting { label, .. } => Some(label),
            SessionState::Idle => None,
        }
    }

    /// Zero when idle.
    pub fn sample_count(&self) -> u32 {
        match self.state {
            SessionState::Collecting { sample_count, .. } => sample_count,
            SessionState::Idle => 0,
        }
    }

    /// Starts collecting for `label`. Ignored (returns false) while a session is
    /// active, whatever its label.
    pub fn start(&mut self, label: Label) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = SessionState::Collecting {
            label,
            sample_count: 0,
        };
        true
    }

    /// Counts one upload attempt. The count tracks attempts, not confirmed writes.
    pub fn record(&mut self, counts: &CountsSnapshot) -> RecordOutcome {
        let SessionState::Collecting {
            label,
            sample_count,
        } = &mut self.state
        else {
            return RecordOutcome::Idle;
        };

        if self.policy == QuotaPolicy::SelfLimit
            && counts.count(*label).saturating_add(*sample_count) >= self.quota
        {
            return RecordOutcome::QuotaReached {
                label: *label,
                sample_count: *sample_count,
            };
        }

        *sample_count += 1;
        RecordOutcome::Recorded {
            label: *label,
            sample_count: *sample_count,
        }
    }

    /// Returns to idle, discarding the count. Returns whether a session was active.
    pub fn stop(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = SessionState::Idle;
        was_active
    }
}

impl Default for CollectionSession {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA, QuotaPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn empty() -> CountsSnapshot {
        CountsSnapshot::default()
    }

    #[test]
    fn second_start_keeps_the_first_label() {
        let mut session = CollectionSession::default();
        assert!(session.start(Label::A));
        session.record(&empty());
        assert!(!session.start(Label::E));
        assert_eq!(
            session.state(),
            SessionState::Collecting {
                label: Label::A,
                sample_count: 1
            }
        );
    }

    #[test]
    fn record_increments_by_one() {
        let mut session = CollectionSession::default();
        session.start(Label::I);
        for expected in 1..=5 {
            assert_eq!(
                session.record(&empty()),
                RecordOutcome::Recorded {
                    label: Label::I,
                    sample_count: expected
                }
            );
        }
    }

    #[test]
    fn record_while_idle_does_nothing() {
        let mut session = CollectionSession::default();
        assert_eq!(session.record(&empty()), RecordOutcome::Idle);
        assert_eq!(session.sample_count(), 0);
    }

    #[test]
    fn stop_resets_and_is_idempotent() {
        let mut session = CollectionSession::default();
        session.start(Label::O);
        session.record(&empty());
        session.record(&empty());
        assert!(session.stop());
        assert!(!session.stop());
        assert_eq!(session.state(), SessionState::Idle);

        session.start(Label::O);
        assert_eq!(session.sample_count(), 0);
    }

    #[test]
    fn self_limit_counts_cached_samples() {
        let counts = CountsSnapshot::new(BTreeMap::from([(Label::U, 8)]));
        let mut session = CollectionSession::new(10, QuotaPolicy::SelfLimit);
        session.start(Label::U);
        assert!(matches!(session.record(&counts), RecordOutcome::Recorded { sample_count: 1, .. }));
        assert!(matches!(session.record(&counts), RecordOutcome::Recorded { sample_count: 2, .. }));
        assert_eq!(
            session.record(&counts),
            RecordOutcome::QuotaReached {
                label: Label::U,
                sample_count: 2
            }
        );
        assert_eq!(session.sample_count(), 2);
    }

    #[test]
    fn advisory_policy_allows_overshoot() {
        let counts = CountsSnapshot::new(BTreeMap::from([(Label::U, 10)]));
        let mut session = CollectionSession::new(10, QuotaPolicy::Advisory);
        session.start(Label::U);
        assert!(matches!(session.record(&counts), RecordOutcome::Recorded { sample_count: 1, .. }));
    }
}
