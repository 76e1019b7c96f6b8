//! Backoff calculation shared by the per-chunk inline retry and the
//! queue-level task retry. Both are "retry up to N times with exponential
//! backoff"; they differ only in base delay, cap, and whether jitter is
//! applied, so the shape is factored once and parameterized.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    base_secs: f64,
    multiplier: f64,
    cap_secs: Option<f64>,
    max_attempts: usize,
    jitter: bool,
}

impl RetryPolicy {
    /// Per-chunk embed/upsert retry: base 2.0s, doubling, 3 attempts, no jitter.
    pub const fn per_chunk() -> Self {
        Self {
            base_secs: 2.0,
            multiplier: 2.0,
            cap_secs: None,
            max_attempts: 3,
            jitter: false,
        }
    }

    /// Queue-level task retry: base 5s, doubling, capped at 60s, jittered.
    pub const fn task_level() -> Self {
        Self {
            base_secs: 5.0,
            multiplier: 2.0,
            cap_secs: Some(60.0),
            max_attempts: 3,
            jitter: true,
        }
    }

    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before the attempt *after* `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let mut secs = self.base_secs * self.multiplier.powi(attempt as i32);
        if let Some(cap) = self.cap_secs {
            secs = secs.min(cap);
        }
        if self.jitter {
            secs *= 0.5 + rand::random::<f64>();
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}
