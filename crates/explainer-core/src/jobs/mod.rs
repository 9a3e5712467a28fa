//! Slide explanation job.
//!
//! ```text
//! deck file ──► extract_slides() ──► [TextUnit] ──► JobRunner::run()
//!                                                      │  per non-blank slide:
//!                                                      ├─► submit_with_retry()  (backoff / cooldown)
//!                                                      ├─► push result          (slide order)
//!                                                      └─► RateGovernor         (spacing / batch cooldown)
//!                                                      │
//!                                                      ▼
//!                                    JobOutcome ──► ResultStore::persist()
//! ```
//!
//! A job runs its slides strictly one after another; the pacing count only
//! makes sense against a single ordered stream. Separate jobs are independent
//! tasks and only share the store's directory.
//!
//! Per-slide terminal failures are recorded in the slide's slot and the run
//! carries on. Only a deck that cannot be opened fails the whole job, and then
//! nothing is written.

pub mod governor;
pub mod retry;
pub mod sleep;
mod types;

pub use governor::{PacingPolicy, RateGovernor};
pub use retry::{submit_with_retry, RetryDecision, RetryPolicy, RetryState};
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};
pub use types::{ExplanationResult, FailureReason, JobOutcome, TextUnit};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::client::ExplanationClient;
use crate::storage::{ResultStore, StoreError};

/// Retry and pacing limits for one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobPolicy {
    pub retry: RetryPolicy,
    pub pacing: PacingPolicy,
}

/// Job-level failures. Slide-level failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to open presentation {path}: {reason}")]
    DocumentOpen { path: PathBuf, reason: String },

    #[error(transparent)]
    Persist(#[from] StoreError),
}

/// Runs slides through the explanation client one at a time.
#[derive(Clone)]
pub struct JobRunner {
    client: Arc<dyn ExplanationClient>,
    sleeper: Arc<dyn Sleeper>,
    policy: JobPolicy,
}

impl JobRunner {
    pub fn new(
        client: Arc<dyn ExplanationClient>,
        sleeper: Arc<dyn Sleeper>,
        policy: JobPolicy,
    ) -> Self {
        Self {
            client,
            sleeper,
            policy,
        }
    }

    /// Runner that waits on the tokio timer.
    pub fn with_tokio_sleep(client: Arc<dyn ExplanationClient>, policy: JobPolicy) -> Self {
        Self::new(client, Arc::new(TokioSleeper), policy)
    }

    /// Explain every non-blank slide, in order.
    pub async fn run(&self, units: Vec<TextUnit>) -> JobOutcome {
        let total = units.len();
        let mut governor = RateGovernor::new(self.policy.pacing);
        let mut outcome = JobOutcome::new();

        for unit in units {
            if unit.is_blank() {
                tracing::debug!(slide = unit.index + 1, "Skipping blank slide");
                continue;
            }

            tracing::info!(
                slide = unit.index + 1,
                total,
                model = self.client.model_id(),
                "Submitting slide for explanation"
            );
            let result = submit_with_retry(
                self.client.as_ref(),
                self.sleeper.as_ref(),
                self.policy.retry,
                &unit.content,
            )
            .await;
            outcome.push(result);

            let wait = governor.after_submission();
            tracing::debug!(
                submitted = governor.submitted(),
                wait_secs = wait.as_secs(),
                "Pacing before next submission"
            );
            self.sleeper.sleep(wait).await;
        }

        tracing::info!(
            explained = outcome.len() - outcome.failed_count(),
            failed = outcome.failed_count(),
            "Finished explaining slides"
        );
        outcome
    }
}

/// Extract, explain and persist one deck.
///
/// Returns the artifact path and the outcome. Nothing is written when the
/// deck cannot be opened.
pub async fn explain_deck(
    runner: &JobRunner,
    store: &ResultStore,
    source: &Path,
) -> Result<(PathBuf, JobOutcome), JobError> {
    tracing::info!(path = %source.display(), "Processing presentation");

    let path = source.to_path_buf();
    let extracted = tokio::task::spawn_blocking(move || crate::slides::extract_slides(&path))
        .await
        .map_err(|e| JobError::DocumentOpen {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;

    let units = extracted.map_err(|e| {
        tracing::error!(path = %source.display(), error = %e, "Failed to open presentation");
        JobError::DocumentOpen {
            path: source.to_path_buf(),
            reason: format!("{e:#}"),
        }
    })?;

    let outcome = runner.run(units).await;
    let artifact = store.persist(source, &outcome)?;
    Ok((artifact, outcome))
}
