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

//! Time source abstraction.
//!
//! The queue never reads the wall clock directly; it goes through [`Clock`]
//! so tests can drive time deterministically with [`ManualClock`]. All
//! timestamps are epoch milliseconds, the unit embedded in queue file names.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 { u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0) }
}

/// A clock that only moves when told to. Share it via `Arc` between the
/// test and the queue under test.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: u64) { self.now.store(now_ms, Ordering::SeqCst); }

    pub fn advance(&self, delta_ms: u64) { self.now.fetch_add(delta_ms, Ordering::SeqCst); }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 { self.now.load(Ordering::SeqCst) }
}
