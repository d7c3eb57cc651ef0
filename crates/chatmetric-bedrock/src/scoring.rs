//! Scoring Client.
//!
//! One call per transcript: the oracle is invoked under a hard timeout,
//! throttling and transient failures are retried with exponential backoff,
//! and the reply is reduced to a [`ScoreOutcome`]. Nothing here raises;
//! every failure mode comes back as a tagged outcome.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use chatmetric_core::models::score::{NoVerdictReason, ScoreOutcome, ScoreScale};
use chatmetric_core::rubric;
use chatmetric_core::transcript::Transcript;
use chatmetric_core::verdict::parse_verdict;

use crate::oracle::ScoringOracle;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How often and how patiently retryable oracle failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`: `base * 2^(attempt - 1)`, capped.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Clone)]
pub struct ScoringClient {
    oracle: Arc<dyn ScoringOracle>,
    scale: ScoreScale,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ScoringClient {
    pub fn new(oracle: Arc<dyn ScoringOracle>) -> Self {
        Self {
            oracle,
            scale: ScoreScale::SURVEY,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            ..retry
        };
        self
    }

    pub fn scale(&self) -> ScoreScale {
        self.scale
    }

    /// Grade one transcript against `system_prompt` (the assembled rubric).
    ///
    /// Identical transcripts are scored independently; nothing is cached.
    pub async fn score(&self, system_prompt: &str, transcript: &Transcript) -> ScoreOutcome {
        let call_id = Uuid::new_v4();
        let user = rubric::user_prompt(transcript);
        let mut attempt = 1;

        loop {
            let call = self.oracle.complete(system_prompt, &user);
            let result = match tokio::time::timeout(self.timeout, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        call_id = %call_id,
                        model_id = self.oracle.model_id(),
                        timeout_secs = self.timeout.as_secs_f64(),
                        "oracle call timed out"
                    );
                    return ScoreOutcome::NoVerdict(NoVerdictReason::TimedOut);
                }
            };

            match result {
                Ok(text) => {
                    debug!(call_id = %call_id, attempt, reply_len = text.len(), "oracle replied");
                    return match parse_verdict(&text, self.scale) {
                        Ok(verdict) => ScoreOutcome::Scored(verdict),
                        Err(reason) => ScoreOutcome::NoVerdict(reason),
                    };
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        call_id = %call_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "oracle call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return ScoreOutcome::CallError(e.to_string()),
            }
        }
    }
}
