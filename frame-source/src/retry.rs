// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Jittered exponential backoff for source implementations.
//!
//! The controller core never retries a failed lane; a source that wants
//! resilience wraps its own fetches. A canceled result is terminal and is
//! returned immediately, no matter how many attempts remain.

use std::future::Future;
use std::time::Duration;

use log::warn;
use rand::Rng;
use tokio::time::sleep;

use crate::{SourceError, SourceResult};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64, max_delay_ms: u64, jitter_pct: f64) -> Self {
        let base = base_delay_ms.max(1);
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base,
            max_delay_ms: max_delay_ms.max(base),
            jitter_pct: jitter_pct.clamp(0.0, 1.0),
        }
    }

    pub fn default_network() -> Self {
        Self::new(5, 250, 5_000, 0.25)
    }

    fn next_delay(&self, attempt: usize) -> Duration {
        let doubled = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt as u32))
            .min(self.max_delay_ms);
        if self.jitter_pct <= 0.0 {
            return Duration::from_millis(doubled);
        }
        let spread = (doubled as f64 * self.jitter_pct) as i64;
        let delta = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_millis(doubled.saturating_add_signed(delta))
    }

    /// Runs `op` until it succeeds, reports cancellation, or fails
    /// `max_attempts` times. The attempt number (0-based) is passed to
    /// each invocation.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> SourceResult<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = SourceResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(SourceError::Canceled) => return Err(SourceError::Canceled),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    let delay = self.next_delay(attempt - 1);
                    warn!(
                        "source fetch failed on attempt {}: {}; retrying in {:?}",
                        attempt, err, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 250, 5_000, 0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::pause;

    #[test]
    fn new_clamps_inputs() {
        let policy = RetryPolicy::new(0, 0, 0, 3.0);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.base_delay_ms, 1);
        assert_eq!(policy.max_delay_ms, 1);
        assert_eq!(policy.jitter_pct, 1.0);
    }

    #[test]
    fn next_delay_doubles_then_caps() {
        let policy = RetryPolicy::new(5, 100, 500, 0.0);
        let delays: Vec<_> = (0..5).map(|attempt| policy.next_delay(attempt)).collect();
        assert_eq!(delays[0], Duration::from_millis(100));
        assert_eq!(delays[1], Duration::from_millis(200));
        assert_eq!(delays[2], Duration::from_millis(400));
        assert_eq!(delays[3], Duration::from_millis(500)); // capped
        assert_eq!(delays[4], Duration::from_millis(500));
    }

    #[tokio::test]
    async fn retries_failures_until_success() {
        pause();
        let policy = RetryPolicy::new(3, 10, 10, 0.0);
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = policy
            .run(|attempt| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(SourceError::failure("transient"))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        pause();
        let policy = RetryPolicy::new(2, 5, 5, 0.0);
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: SourceResult<()> = policy
            .run(|_| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(SourceError::failure("down"))
                }
            })
            .await;

        assert!(matches!(result, Err(SourceError::Failure { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn never_retries_a_canceled_result() {
        pause();
        let policy = RetryPolicy::new(5, 5, 5, 0.0);
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: SourceResult<()> = policy
            .run(|_| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(SourceError::Canceled)
                }
            })
            .await;

        assert!(matches!(result, Err(SourceError::Canceled)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
