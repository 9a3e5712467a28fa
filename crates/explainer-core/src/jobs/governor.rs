//! Pacing between slide submissions.
//!
//! Independent of retry backoff: after every submitted slide the runner waits
//! a fixed spacing, and every `batch_size`-th submission waits the longer
//! batch cooldown instead.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pacing limits, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingPolicy {
    pub spacing_secs: u64,
    pub batch_size: u32,
    pub batch_cooldown_secs: u64,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            spacing_secs: 20,
            batch_size: 3,
            batch_cooldown_secs: 60,
        }
    }
}

/// Counts submissions within one run and hands out the next wait.
#[derive(Debug, Clone)]
pub struct RateGovernor {
    policy: PacingPolicy,
    submitted: u32,
}

impl RateGovernor {
    pub fn new(policy: PacingPolicy) -> Self {
        Self {
            policy,
            submitted: 0,
        }
    }

    /// Slides submitted so far in this run.
    pub fn submitted(&self) -> u32 {
        self.submitted
    }

    /// Record one submitted slide and return how long to wait before the next.
    pub fn after_submission(&mut self) -> Duration {
        self.submitted += 1;
        let batch_size = self.policy.batch_size.max(1);
        if self.submitted % batch_size == 0 {
            Duration::from_secs(self.policy.batch_cooldown_secs)
        } else {
            Duration::from_secs(self.policy.spacing_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_every_third_submission() {
        let mut governor = RateGovernor::new(PacingPolicy::default());
        let delays: Vec<u64> = (0..7)
            .map(|_| governor.after_submission().as_secs())
            .collect();

        assert_eq!(delays, vec![20, 20, 60, 20, 20, 60, 20]);
        assert_eq!(governor.submitted(), 7);
    }

    #[test]
    fn test_zero_batch_size_is_treated_as_one() {
        let mut governor = RateGovernor::new(PacingPolicy {
            batch_size: 0,
            ..PacingPolicy::default()
        });
        assert_eq!(governor.after_submission(), Duration::from_secs(60));
        assert_eq!(governor.after_submission(), Duration::from_secs(60));
    }
}
