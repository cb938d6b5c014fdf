//! Scheduler State Machine
//!
//! Defines the states a pipeline scheduler moves through.

use serde::{Deserialize, Serialize};

/// Scheduler states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Waiting for the next tick; the last run (if any) succeeded
    Idle,
    /// A pipeline run is in flight
    Running,
    /// Waiting for the next tick; the last run failed
    IdleWithError,
}

impl SchedulerState {
    /// Check if transition is valid
    pub fn can_transition_to(&self, target: SchedulerState) -> bool {
        use SchedulerState::*;

        match (self, target) {
            (Idle, Running) => true,
            (IdleWithError, Running) => true,

            (Running, Idle) => true,
            (Running, IdleWithError) => true,

            _ => false,
        }
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::IdleWithError => write!(f, "idle_with_error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use SchedulerState::*;

        assert!(Idle.can_transition_to(Running));
        assert!(IdleWithError.can_transition_to(Running));
        assert!(Running.can_transition_to(Idle));
        assert!(Running.can_transition_to(IdleWithError));

        assert!(!Running.can_transition_to(Running));
        assert!(!Idle.can_transition_to(IdleWithError));
        assert!(!IdleWithError.can_transition_to(Idle));
    }

    #[test]
    fn test_display_matches_serde() {
        for state in [SchedulerState::Idle, SchedulerState::Running, SchedulerState::IdleWithError] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
        }
    }
}
