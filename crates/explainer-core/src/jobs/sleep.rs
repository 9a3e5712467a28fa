//! Waiting seam for backoff and pacing delays.
//!
//! The retry engine and rate governor only compute delays; the runner hands
//! them to a [`Sleeper`], so tests can swap in a recorder instead of waiting
//! on the wall clock.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

/// Waits for a requested delay.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Cooperative sleep on the tokio timer; other jobs keep running.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// Sum of all requested delays.
    pub fn total(&self) -> Duration {
        self.delays().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sleeper_keeps_order() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(20)).await;
        sleeper.sleep(Duration::from_secs(60)).await;

        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(20), Duration::from_secs(60)]
        );
        assert_eq!(sleeper.total(), Duration::from_secs(80));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_advances_virtual_time() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(60)).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
