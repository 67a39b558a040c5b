//! Bounded retry with a fixed interval.
//!
//! Used to wait for something that may not exist yet (a section that is still
//! rendering). The caller performs each probe; this module only decides whether
//! another probe is allowed and when.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Time between the first and the last probe when nothing is ever found.
    pub fn worst_case_span(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    Done,
    RetryAfter(Duration),
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records the outcome of one probe.
    pub fn record(&mut self, found: bool) -> RetryStep {
        self.attempts = self.attempts.saturating_add(1);
        if found {
            RetryStep::Done
        } else if self.attempts >= self.policy.max_attempts {
            RetryStep::Exhausted
        } else {
            RetryStep::RetryAfter(self.policy.interval)
        }
    }
}
