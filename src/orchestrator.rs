use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, ErrorCode, Job, Submission, TranslatedResult, TranslationApi};
use crate::translation::{
    Phase, PollOutcome, PollPolicy, RETRY_ATTEMPT_COST, RetryBudget, TranslationRun,
};

/// Waits between calls. Every wait runs to completion once started.
pub trait Delay {
    async fn wait(&self, duration: Duration);
}

/// Suspends the current task with `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Terminal failures of an error translation run.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request was not accepted (status {status})")]
    SubmitRejected { status: u16, body: String },

    #[error("the error code could not be translated")]
    InvalidErrorCode { body: String },

    #[error("access to the translation was denied")]
    AccessDenied { body: String },

    #[error("operation took too long: no translation after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("transport error: {0}")]
    Transport(#[source] ApiError),

    #[error("malformed translation result: {0}")]
    MalformedResult(#[source] ApiError),
}

impl TranslateError {
    /// Response body the server sent along with the failure, if any.
    pub fn server_body(&self) -> Option<&str> {
        match self {
            TranslateError::SubmitRejected { body, .. }
            | TranslateError::InvalidErrorCode { body }
            | TranslateError::AccessDenied { body } => Some(body.as_str()),
            _ => None,
        }
    }
}

/// Drives one error translation from submit to a terminal outcome.
pub struct RetryOrchestrator<A, D = TokioDelay> {
    api: A,
    delay: D,
    policy: PollPolicy,
}

impl<A: TranslationApi> RetryOrchestrator<A> {
    pub fn new(api: A, policy: PollPolicy) -> Self {
        Self::with_delay(api, policy, TokioDelay)
    }
}

impl<A: TranslationApi, D: Delay> RetryOrchestrator<A, D> {
    pub fn with_delay(api: A, policy: PollPolicy, delay: D) -> Self {
        Self { api, delay, policy }
    }

    /// Translate `raw_code`, returning only the final outcome.
    #[allow(dead_code)]
    pub async fn translate(&self, raw_code: &str) -> Result<TranslatedResult, TranslateError> {
        self.run(raw_code).await.1
    }

    /// Translate `raw_code`, returning the run record alongside the outcome.
    pub async fn run(
        &self,
        raw_code: &str,
    ) -> (TranslationRun, Result<TranslatedResult, TranslateError>) {
        let mut run = TranslationRun::new(
            ErrorCode::new(raw_code),
            RetryBudget::new(self.policy.retries),
        );

        let result = self.drive(&mut run).await;
        match &result {
            Ok(_) => run.advance(Phase::Succeeded),
            Err(err) => {
                debug!(error = %err, phase = %run.phase, "translation run failed");
                run.advance(Phase::Failed);
            }
        }
        (run, result)
    }

    async fn drive(&self, run: &mut TranslationRun) -> Result<TranslatedResult, TranslateError> {
        info!(
            error_code = %run.error_code,
            "launching error translation request, note that '#' is ignored"
        );

        let job = self.submit(run).await?;
        info!(request_id = %job.id, "request for error code translation was submitted");
        run.job = Some(job.clone());

        self.wait_interval(run, &job).await;
        let mut outcome = self.attempt(run, &job).await?;
        run.budget.charge(self.policy.first_attempt_cost);

        loop {
            match outcome {
                PollOutcome::Success(result) => return Ok(result),
                PollOutcome::ClientError(body) => {
                    return Err(TranslateError::InvalidErrorCode { body });
                }
                PollOutcome::Forbidden(body) => return Err(TranslateError::AccessDenied { body }),
                PollOutcome::Pending { status } => {
                    debug!(status, "translation is not ready yet");
                }
                PollOutcome::RateLimited => {
                    warn!("poll was rate limited, waiting for the next interval");
                }
                PollOutcome::TransportError(err) => {
                    warn!(error = %err, "poll failed, counting it against the retry budget");
                }
            }

            if run.budget.is_exhausted() {
                error!(attempts = run.attempts, "operation took too long, giving up");
                return Err(TranslateError::Exhausted {
                    attempts: run.attempts,
                });
            }

            self.wait_interval(run, &job).await;
            run.budget.charge(RETRY_ATTEMPT_COST);
            outcome = self.attempt(run, &job).await?;
        }
    }

    /// Submits the code, applying the one-time rate-limit wait.
    async fn submit(&self, run: &mut TranslationRun) -> Result<Job, TranslateError> {
        let mut submission = self
            .api
            .submit(&run.error_code)
            .await
            .map_err(TranslateError::Transport)?;
        run.advance(Phase::Submitted);

        if submission.is_rate_limited() {
            run.advance(Phase::RateLimitWait);
            info!(
                wait_secs = self.policy.rate_limit_wait.as_secs(),
                "request limit per 60 seconds reached, waiting before continuing"
            );
            self.delay.wait(self.policy.rate_limit_wait).await;

            if submission.status() == 429 {
                submission = self
                    .api
                    .submit(&run.error_code)
                    .await
                    .map_err(TranslateError::Transport)?;
                run.advance(Phase::Submitted);
            }
        }

        let Submission { response, job } = submission;
        match job {
            Some(job) if response.status == 202 => Ok(job),
            _ => {
                error!(
                    status = response.status,
                    "something went wrong, re-run with --debug"
                );
                Err(TranslateError::SubmitRejected {
                    status: response.status,
                    body: response.body,
                })
            }
        }
    }

    async fn wait_interval(&self, run: &mut TranslationRun, job: &Job) {
        run.advance(Phase::PollWait);
        info!("polling error code in {} seconds", job.retry_after_secs);
        self.delay.wait(job.poll_interval()).await;
    }

    async fn attempt(
        &self,
        run: &mut TranslationRun,
        job: &Job,
    ) -> Result<PollOutcome, TranslateError> {
        run.advance(Phase::Polling);
        run.attempts += 1;
        info!(
            request_id = %job.id,
            "making translate error request, attempt {} out of {}",
            run.attempts,
            run.budget.total()
        );

        let result = self.api.fetch(&job.id).await;
        PollOutcome::classify(result).map_err(TranslateError::MalformedResult)
    }
}
