//! Delay strategies between proposal attempts

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use synod_core::{RetryConfig, RetryPolicy};

/// Same pause before every retry
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl RetryPolicy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Exponential backoff, capped at `max`, with optional 50%-150% jitter
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(10),
            max: Duration::from_secs(1),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl ExponentialBackoff {
    fn base(&self, attempt: u32) -> f64 {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base = self.initial.as_secs_f64() * self.multiplier.powi(exponent);
        base.min(self.max.as_secs_f64())
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base(attempt);
        let secs = if self.jitter {
            base * rand::thread_rng().gen_range(0.5..1.5)
        } else {
            base
        };
        Duration::from_secs_f64(secs)
    }
}

/// Build the policy described by `config`
pub fn retry_policy(config: &RetryConfig) -> Arc<dyn RetryPolicy> {
    match *config {
        RetryConfig::Fixed { delay_ms } => Arc::new(FixedDelay(Duration::from_millis(delay_ms))),
        RetryConfig::Exponential {
            initial_ms,
            max_ms,
            multiplier,
            jitter,
        } => Arc::new(ExponentialBackoff {
            initial: Duration::from_millis(initial_ms),
            max: Duration::from_millis(max_ms),
            multiplier,
            jitter,
        }),
    }
}
