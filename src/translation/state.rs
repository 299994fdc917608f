use std::fmt;

use serde::{Deserialize, Serialize};

/// Phases of a single error translation run.
///
/// A run flows through: INIT → SUBMITTED → (RATE_LIMIT_WAIT) → POLL_WAIT →
/// POLLING, looping between POLL_WAIT and POLLING until it ends in
/// SUCCEEDED or FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Init,
    Submitted,
    RateLimitWait,
    PollWait,
    Polling,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }

    /// Whether `next` is a legal successor of this phase.
    pub fn can_advance_to(self, next: Phase) -> bool {
        match (self, next) {
            (Phase::Init, Phase::Submitted | Phase::Failed) => true,
            (Phase::Submitted, Phase::RateLimitWait | Phase::PollWait | Phase::Failed) => true,
            (Phase::RateLimitWait, Phase::Submitted | Phase::PollWait | Phase::Failed) => true,
            (Phase::PollWait, Phase::Polling) => true,
            (Phase::Polling, Phase::PollWait | Phase::Succeeded | Phase::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => write!(f, "INIT"),
            Phase::Submitted => write!(f, "SUBMITTED"),
            Phase::RateLimitWait => write!(f, "RATE_LIMIT_WAIT"),
            Phase::PollWait => write!(f, "POLL_WAIT"),
            Phase::Polling => write!(f, "POLLING"),
            Phase::Succeeded => write!(f, "SUCCEEDED"),
            Phase::Failed => write!(f, "FAILED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        let path = [
            Phase::Init,
            Phase::Submitted,
            Phase::PollWait,
            Phase::Polling,
            Phase::PollWait,
            Phase::Polling,
            Phase::Succeeded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn rate_limit_wait_may_resubmit() {
        assert!(Phase::Submitted.can_advance_to(Phase::RateLimitWait));
        assert!(Phase::RateLimitWait.can_advance_to(Phase::Submitted));
        assert!(Phase::RateLimitWait.can_advance_to(Phase::PollWait));
    }

    #[test]
    fn terminal_phases_go_nowhere() {
        for next in [Phase::Init, Phase::Polling, Phase::Failed] {
            assert!(!Phase::Succeeded.can_advance_to(next));
            assert!(!Phase::Failed.can_advance_to(next));
        }
        assert!(Phase::Succeeded.is_terminal());
        assert!(!Phase::Polling.is_terminal());
    }

    #[test]
    fn polling_requires_a_wait_first() {
        assert!(!Phase::Submitted.can_advance_to(Phase::Polling));
        assert!(!Phase::Init.can_advance_to(Phase::PollWait));
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Init.to_string(), "INIT");
        assert_eq!(Phase::RateLimitWait.to_string(), "RATE_LIMIT_WAIT");
        assert_eq!(Phase::PollWait.to_string(), "POLL_WAIT");
        assert_eq!(Phase::Succeeded.to_string(), "SUCCEEDED");
    }
}
