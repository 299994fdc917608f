mod job;
mod state;

pub use job::{
    DEFAULT_RETRIES, FIRST_ATTEMPT_COST, PollOutcome, PollPolicy, RATE_LIMIT_WAIT_SECS,
    RETRY_ATTEMPT_COST, RetryBudget, RunSummary, TranslationRun,
};
pub use state::Phase;
