//! Retry and backoff policy for a single slide submission.
//!
//! Each failure class gets its own handling:
//!
//! | class          | handling                                        |
//! |----------------|-------------------------------------------------|
//! | `RateLimited`  | fixed cooldown, consumes an attempt             |
//! | `Transient`    | exponential backoff (1, 2, 4, ... capped at 60) |
//! | `NonRetryable` | give up immediately with the quota message      |
//! | `Unclassified` | give up immediately with the error text         |
//!
//! When the attempt budget runs out the slide is recorded as exhausted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{ExplanationClient, ExplanationError};

use super::sleep::Sleeper;
use super::types::{ExplanationResult, FailureReason};

pub const QUOTA_MESSAGE: &str = "Insufficient quota to process this request. \
    Please check your OpenAI plan and billing details.";
pub const EXHAUSTED_MESSAGE: &str = "Failed to get explanation after several retries.";

/// Recorded message for an unclassified failure.
pub fn unclassified_message(detail: &str) -> String {
    format!("Error processing slide: {detail}")
}

/// Retry limits, in seconds where applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    pub rate_limit_cooldown_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_secs: 1,
            max_backoff_secs: 60,
            rate_limit_cooldown_secs: 60,
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again
    Retry(Duration),
    /// Stop and record this result for the slide
    GiveUp(ExplanationResult),
}

/// Per-slide retry state. Pure; does no waiting itself.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
    backoff: Duration,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            backoff: Duration::from_secs(policy.initial_backoff_secs),
        }
    }

    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Note that a request is about to be sent.
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    fn has_attempts_left(&self) -> bool {
        self.attempts < self.policy.max_attempts
    }

    /// Decide how to proceed after `err`.
    pub fn on_failure(&mut self, err: &ExplanationError) -> RetryDecision {
        let delay = match err {
            ExplanationError::NonRetryable(_) => {
                return RetryDecision::GiveUp(ExplanationResult::failed(
                    FailureReason::NonRetryable,
                    QUOTA_MESSAGE,
                ));
            }
            ExplanationError::Unclassified(detail) => {
                return RetryDecision::GiveUp(ExplanationResult::failed(
                    FailureReason::Unclassified,
                    unclassified_message(detail),
                ));
            }
            ExplanationError::RateLimited(_) => {
                Duration::from_secs(self.policy.rate_limit_cooldown_secs)
            }
            ExplanationError::Transient(_) => {
                let cap = Duration::from_secs(self.policy.max_backoff_secs);
                let delay = self.backoff.min(cap);
                self.backoff = self.backoff.saturating_mul(2).min(cap);
                delay
            }
        };

        if self.has_attempts_left() {
            RetryDecision::Retry(delay)
        } else {
            RetryDecision::GiveUp(ExplanationResult::failed(
                FailureReason::AttemptsExhausted,
                EXHAUSTED_MESSAGE,
            ))
        }
    }
}

/// Submit one slide, retrying per `policy`. Always yields a result.
pub async fn submit_with_retry(
    client: &dyn ExplanationClient,
    sleeper: &dyn Sleeper,
    policy: RetryPolicy,
    text: &str,
) -> ExplanationResult {
    let mut state = RetryState::new(policy);

    loop {
        state.begin_attempt();
        let err = match client.explain(text).await {
            Ok(explanation) => return ExplanationResult::explained(explanation),
            Err(err) => err,
        };

        match state.on_failure(&err) {
            RetryDecision::Retry(delay) => {
                match err {
                    ExplanationError::RateLimited(_) => tracing::warn!(
                        attempt = state.attempts(),
                        wait_secs = delay.as_secs(),
                        "Rate limit exceeded, cooling down before retrying"
                    ),
                    _ => tracing::error!(
                        attempt = state.attempts(),
                        wait_secs = delay.as_secs(),
                        error = %err,
                        "API error, retrying with backoff"
                    ),
                }
                sleeper.sleep(delay).await;
            }
            RetryDecision::GiveUp(result) => {
                tracing::error!(
                    attempts = state.attempts(),
                    error = %err,
                    "Giving up on slide"
                );
                return result;
            }
        }
    }
}
