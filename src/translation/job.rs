use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::Phase;
use crate::api::{ApiError, ApiResponse, ErrorCode, Job, TranslatedResult};

/// Default number of budget units for one translation.
pub const DEFAULT_RETRIES: u32 = 50;

/// Budget units charged for the first poll.
///
/// The initial wait and the first call are charged together, so the first
/// attempt costs two units while every later attempt costs one.
pub const FIRST_ATTEMPT_COST: u32 = 2;

/// Budget units charged for every poll after the first.
pub const RETRY_ATTEMPT_COST: u32 = 1;

/// One-time penalty applied when the submit call is throttled.
pub const RATE_LIMIT_WAIT_SECS: u64 = 61;

/// Knobs of the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub retries: u32,
    pub first_attempt_cost: u32,
    pub rate_limit_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            first_attempt_cost: FIRST_ATTEMPT_COST,
            rate_limit_wait: Duration::from_secs(RATE_LIMIT_WAIT_SECS),
        }
    }
}

/// Counts down the polling attempts a run may still make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryBudget {
    total: u32,
    remaining: u32,
}

impl RetryBudget {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            remaining: total,
        }
    }

    pub fn charge(&mut self, units: u32) {
        self.remaining = self.remaining.saturating_sub(units);
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Classification of a single poll response.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Not ready yet, or a status with no special meaning.
    Pending { status: u16 },
    Success(TranslatedResult),
    RateLimited,
    /// HTTP 400: the error code itself is invalid.
    ClientError(String),
    /// HTTP 403.
    Forbidden(String),
    TransportError(ApiError),
}

impl PollOutcome {
    /// Classifies the result of a poll call.
    ///
    /// Fails only when the server reports success but the body is not JSON.
    pub fn classify(result: Result<ApiResponse, ApiError>) -> Result<Self, ApiError> {
        let response = match result {
            Ok(response) => response,
            Err(err) => return Ok(PollOutcome::TransportError(err)),
        };

        let outcome = match response.status {
            200 => PollOutcome::Success(response.json()?),
            400 => PollOutcome::ClientError(response.body),
            403 => PollOutcome::Forbidden(response.body),
            429 => PollOutcome::RateLimited,
            status => PollOutcome::Pending { status },
        };
        Ok(outcome)
    }

    #[allow(dead_code)]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollOutcome::Success(_) | PollOutcome::ClientError(_) | PollOutcome::Forbidden(_)
        )
    }
}

/// Everything that happened during one translation run.
#[derive(Debug, Clone)]
pub struct TranslationRun {
    pub error_code: ErrorCode,
    pub job: Option<Job>,
    pub phase: Phase,
    pub history: Vec<Phase>,
    pub attempts: u32,
    pub budget: RetryBudget,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TranslationRun {
    pub fn new(error_code: ErrorCode, budget: RetryBudget) -> Self {
        Self {
            error_code,
            job: None,
            phase: Phase::Init,
            history: Vec::new(),
            attempts: 0,
            budget,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Moves to `next`, recording the phase being left.
    pub fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transition {} -> {next}",
            self.phase
        );
        self.history.push(self.phase);
        self.phase = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }

    /// Full phase trail, including the current phase.
    pub fn transitions(&self) -> Vec<Phase> {
        let mut phases = self.history.clone();
        phases.push(self.phase);
        phases
    }

    pub fn summary(&self) -> RunSummary {
        let completed_at = self.finished_at.unwrap_or_else(Utc::now);
        RunSummary {
            request_id: self.job.as_ref().map(|job| job.id.clone()),
            error_code: self.error_code.to_string(),
            phases: self.transitions(),
            attempts: self.attempts,
            budget_total: self.budget.total(),
            budget_remaining: self.budget.remaining(),
            started_at: self.started_at,
            completed_at,
            duration_ms: (completed_at - self.started_at).num_milliseconds(),
        }
    }
}

/// Structured record of a finished run, printed in debug mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub request_id: Option<String>,
    pub error_code: String,
    pub phases: Vec<Phase>,
    pub attempts: u32,
    pub budget_total: u32,
    pub budget_remaining: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}
