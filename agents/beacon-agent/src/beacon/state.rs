//! Beacon State Management
//!
//! Tracks the scheduler state machine (`Waiting` → `Probing` → `Waiting`,
//! ending in `Terminated`) along with probe counters.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::duration::format_duration;
use crate::probe::executor::ProbeOutcome;

/// Represents the possible states of the beacon scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconState {
    /// Waiting out the current delay, racing cancellation
    Waiting,
    /// A probe is in flight; cancellation is not observed
    Probing,
    /// Cancelled; no further probe will run
    Terminated,
}

impl std::fmt::Display for BeaconState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeaconState::Waiting => write!(f, "Waiting"),
            BeaconState::Probing => write!(f, "Probing"),
            BeaconState::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Internal state data
struct BeaconStateInner {
    current: BeaconState,
    probes_attempted: u64,
    consecutive_failures: u32,
    last_success: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Thread-safe beacon state manager
///
/// Cloning shares the same underlying state, so a caller can keep a handle
/// while the scheduler owns another.
#[derive(Clone)]
pub struct BeaconStateManager {
    inner: Arc<RwLock<BeaconStateInner>>,
}

impl BeaconStateManager {
    /// Create a new state manager in `Waiting(0)`
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BeaconStateInner {
                current: BeaconState::Waiting,
                probes_attempted: 0,
                consecutive_failures: 0,
                last_success: None,
                last_error: None,
            })),
        }
    }

    /// Get the current state
    pub fn current_state(&self) -> BeaconState {
        self.inner.read().current
    }

    pub fn probes_attempted(&self) -> u64 {
        self.inner.read().probes_attempted
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.read().consecutive_failures
    }

    /// Get the time of the last successful probe
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.inner.read().last_success
    }

    /// Get the reason of the last failed probe
    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    /// Transition to a new state
    pub fn transition_to(&self, new_state: BeaconState) -> bool {
        let mut inner = self.inner.write();

        if !Self::is_valid_transition(inner.current, new_state) {
            tracing::warn!(
                from = %inner.current,
                to = %new_state,
                "Rejected beacon state transition"
            );
            return false;
        }

        let old_state = inner.current;
        inner.current = new_state;

        if new_state == BeaconState::Probing {
            inner.probes_attempted += 1;
        }

        tracing::debug!(
            from = %old_state,
            to = %new_state,
            probes = inner.probes_attempted,
            "Beacon state transition"
        );

        true
    }

    /// Check if a state transition is valid
    fn is_valid_transition(from: BeaconState, to: BeaconState) -> bool {
        matches!(
            (from, to),
            (BeaconState::Waiting, BeaconState::Waiting)
                | (BeaconState::Waiting, BeaconState::Probing)
                | (BeaconState::Waiting, BeaconState::Terminated)
                | (BeaconState::Probing, BeaconState::Waiting)
        )
    }

    /// Enter `Waiting(delay)`
    pub fn set_waiting(&self, delay: Duration) {
        if self.transition_to(BeaconState::Waiting) {
            tracing::debug!(delay = %format_duration(delay), "Waiting before next probe");
        }
    }

    /// Enter `Probing`
    pub fn set_probing(&self) {
        self.transition_to(BeaconState::Probing);
    }

    /// Enter `Terminated`
    pub fn set_terminated(&self) {
        self.transition_to(BeaconState::Terminated);
    }

    /// Fold a probe outcome into the counters
    pub fn record_outcome(&self, outcome: &ProbeOutcome) {
        let mut inner = self.inner.write();
        match outcome {
            ProbeOutcome::Success => {
                inner.consecutive_failures = 0;
                inner.last_success = Some(Utc::now());
            }
            ProbeOutcome::Failure(reason) => {
                inner.consecutive_failures += 1;
                inner.last_error = Some(reason.clone());
            }
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.current_state() == BeaconState::Terminated
    }
}

impl Default for BeaconStateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let manager = BeaconStateManager::new();
        assert_eq!(manager.current_state(), BeaconState::Waiting);
        assert_eq!(manager.consecutive_failures(), 0);
        assert!(manager.last_success().is_none());
        assert_eq!(manager.probes_attempted(), 0);
    }

    #[test]
    fn test_valid_transitions() {
        let manager = BeaconStateManager::new();

        assert!(manager.transition_to(BeaconState::Probing));
        assert_eq!(manager.current_state(), BeaconState::Probing);
        assert_eq!(manager.probes_attempted(), 1);

        assert!(manager.transition_to(BeaconState::Waiting));
        assert!(manager.transition_to(BeaconState::Terminated));
        assert!(manager.is_terminated());
    }

    #[test]
    fn test_invalid_transitions() {
        let manager = BeaconStateManager::new();

        manager.set_probing();
        // Cancellation is only observed while waiting
        assert!(!manager.transition_to(BeaconState::Terminated));

        manager.set_waiting(Duration::from_secs(1));
        manager.set_terminated();
        assert!(!manager.transition_to(BeaconState::Waiting));
        assert!(!manager.transition_to(BeaconState::Probing));
        assert_eq!(manager.probes_attempted(), 1);
    }

    #[test]
    fn test_outcome_counters() {
        let manager = BeaconStateManager::new();

        manager.record_outcome(&ProbeOutcome::Failure("refused".to_string()));
        manager.record_outcome(&ProbeOutcome::Failure("timeout".to_string()));
        assert_eq!(manager.consecutive_failures(), 2);
        assert_eq!(manager.last_error().as_deref(), Some("timeout"));
        assert!(manager.last_success().is_none());

        manager.record_outcome(&ProbeOutcome::Success);
        assert_eq!(manager.consecutive_failures(), 0);
        assert!(manager.last_success().is_some());
    }

    #[test]
    fn test_success_keeps_last_error() {
        let manager = BeaconStateManager::new();
        let before = Utc::now();

        manager.record_outcome(&ProbeOutcome::Failure("refused".to_string()));
        manager.record_outcome(&ProbeOutcome::Success);

        assert_eq!(manager.last_error().as_deref(), Some("refused"));
        assert!(manager.last_success().is_some_and(|at| at >= before));
    }
}
