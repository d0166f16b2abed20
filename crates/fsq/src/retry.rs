// Copyright 2025 Courier Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

//! Backoff after failed processing attempts.
//!
//! [`ExponentialBackoff`] draws the delay from an exponential distribution,
//! re-sampling until the draw falls within the configured bounds. The
//! jitter keeps a fleet of clients from retrying against a degraded server
//! in lockstep; the min bound enforces a courtesy delay and the max bound
//! caps how stale locally-buffered data can get.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Reacts to processing outcomes and gates the next attempt.
pub trait RetryPolicy: Send + 'static {
    /// A file was processed successfully; clear all delays.
    fn on_success(&mut self, now_ms: u64);

    /// A processing attempt failed; set or extend the delay.
    fn on_failure(&mut self, now_ms: u64);

    /// Remaining wait in milliseconds, or `None` if ready to process.
    fn should_wait(&self, now_ms: u64) -> Option<u64>;
}

/// Parameters of the exponential delay distribution, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffParams {
    pub mean_ms: f64,
    pub min_ms:  f64,
    pub max_ms:  f64,
}

impl Default for BackoffParams {
    /// Mean 15 minutes, min 1 minute, max 24 hours.
    fn default() -> Self {
        Self {
            mean_ms: 15.0 * 60.0 * 1e3,
            min_ms:  60.0 * 1e3,
            max_ms:  24.0 * 60.0 * 60.0 * 1e3,
        }
    }
}

/// Exponential, jittered, clamped backoff.
pub struct ExponentialBackoff {
    params:         BackoffParams,
    last_update_ms: u64,
    ready_at_ms:    u64,
    rng:            StdRng,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(params: BackoffParams) -> Self {
        Self {
            params,
            last_update_ms: 0,
            ready_at_ms: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic variant for tests.
    #[must_use]
    pub fn with_seed(params: BackoffParams, seed: u64) -> Self {
        Self {
            params,
            last_update_ms: 0,
            ready_at_ms: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn draw_delay_ms(&mut self) -> f64 {
        loop {
            let uniform: f64 = self.rng.r#gen();
            let delay = -self.params.mean_ms * (1.0 - uniform).ln();
            if delay >= self.params.min_ms && delay <= self.params.max_ms {
                return delay;
            }
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self { Self::new(BackoffParams::default()) }
}

impl RetryPolicy for ExponentialBackoff {
    fn on_success(&mut self, now_ms: u64) {
        self.last_update_ms = now_ms;
        self.ready_at_ms = now_ms;
    }

    fn on_failure(&mut self, now_ms: u64) {
        let delay = self.draw_delay_ms() as u64;
        // Never shrink: a stale in-flight computation must not cut an
        // already-scheduled backoff short.
        self.ready_at_ms = self.ready_at_ms.max(now_ms + delay);
        self.last_update_ms = now_ms;
    }

    fn should_wait(&self, now_ms: u64) -> Option<u64> {
        (now_ms < self.ready_at_ms).then(|| self.ready_at_ms - now_ms)
    }
}

/// No delays at all; every attempt is made as soon as a file is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateRetry;

impl RetryPolicy for ImmediateRetry {
    fn on_success(&mut self, _now_ms: u64) {}

    fn on_failure(&mut self, _now_ms: u64) {}

    fn should_wait(&self, _now_ms: u64) -> Option<u64> { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BackoffParams {
        BackoffParams {
            mean_ms: 1000.0,
            min_ms:  100.0,
            max_ms:  5000.0,
        }
    }

    #[test]
    fn test_fresh_policy_is_ready() {
        let backoff = ExponentialBackoff::with_seed(params(), 1);
        assert_eq!(backoff.should_wait(0), None);
        assert_eq!(backoff.should_wait(1_000_000), None);
    }

    #[test]
    fn test_failure_delay_is_within_bounds() {
        for seed in 0..32 {
            let mut backoff = ExponentialBackoff::with_seed(params(), seed);
            backoff.on_failure(10_000);
            let wait = backoff.should_wait(10_000).expect("failure must delay");
            assert!(wait >= 100, "wait {wait} below min");
            assert!(wait <= 5000, "wait {wait} above max");
        }
    }

    #[test]
    fn test_backoff_never_shrinks() {
        let mut backoff = ExponentialBackoff::with_seed(params(), 7);
        backoff.on_failure(10_000);
        let first = backoff.should_wait(10_000).unwrap();

        // A second failure reported at an earlier clock reading must not
        // move the ready time backwards.
        backoff.on_failure(9_000);
        let second = backoff.should_wait(10_000).unwrap();
        assert!(second >= first);
    }

    #[test]
    fn test_success_clears_delay() {
        let mut backoff = ExponentialBackoff::with_seed(params(), 3);
        backoff.on_failure(10_000);
        assert!(backoff.should_wait(10_000).is_some());
        backoff.on_success(10_500);
        assert_eq!(backoff.should_wait(10_500), None);
    }

    #[test]
    fn test_wait_expires() {
        let mut backoff = ExponentialBackoff::with_seed(params(), 5);
        backoff.on_failure(10_000);
        let wait = backoff.should_wait(10_000).unwrap();
        assert_eq!(backoff.should_wait(10_000 + wait), None);
    }

    #[test]
    fn test_immediate_retry_never_waits() {
        let mut policy = ImmediateRetry;
        policy.on_failure(1);
        assert_eq!(policy.should_wait(1), None);
    }
}
