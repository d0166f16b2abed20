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

//! Queue construction.
//!
//! Every policy is an injection point with a production default:
//!
//! ```ignore
//! let queue = FsqBuilder::new("/var/lib/app/telemetry")
//!     .separator("\n")
//!     .resume_policy(NeverResume)
//!     .build(uploader)?;
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    FileStorageQueue, Result,
    append::{AppendStrategy, RawAppend, SeparatorAppend},
    clock::{Clock, SystemClock},
    finalize::{FinalizePolicy, ThresholdFinalizePolicy},
    processor::FileProcessor,
    purge::{CapPurgePolicy, PurgePolicy},
    queue::QueueOptions,
    resume::{ResumeByDefault, ResumePolicy},
    retry::{ExponentialBackoff, RetryPolicy},
};

const DEFAULT_AGE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Builder for [`FileStorageQueue`].
pub struct FsqBuilder {
    options: QueueOptions,
}

impl FsqBuilder {
    /// Starts a builder over `dir` with production defaults: system clock,
    /// raw appends, threshold finalization, capped purge, exponential
    /// retry backoff, and resume-by-default.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            options: QueueOptions {
                dir:                dir.into(),
                clock:              Arc::new(SystemClock),
                append:             Box::new(RawAppend),
                finalize:           Box::new(ThresholdFinalizePolicy::default()),
                purge:              Box::new(CapPurgePolicy::default()),
                retry:              Box::new(ExponentialBackoff::default()),
                resume:             Box::new(ResumeByDefault),
                age_check_interval: DEFAULT_AGE_CHECK_INTERVAL,
            },
        }
    }

    /// Injects a clock, usually a shared [`ManualClock`](crate::ManualClock)
    /// in tests.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.options.clock = clock;
        self
    }

    #[must_use]
    pub fn append_strategy(mut self, strategy: impl AppendStrategy) -> Self {
        self.options.append = Box::new(strategy);
        self
    }

    /// Shorthand for the separator append strategy.
    #[must_use]
    pub fn separator(self, separator: impl Into<Vec<u8>>) -> Self {
        self.append_strategy(SeparatorAppend::new(separator))
    }

    #[must_use]
    pub fn finalize_policy(mut self, policy: impl FinalizePolicy) -> Self {
        self.options.finalize = Box::new(policy);
        self
    }

    #[must_use]
    pub fn purge_policy(mut self, policy: impl PurgePolicy) -> Self {
        self.options.purge = Box::new(policy);
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: impl RetryPolicy) -> Self {
        self.options.retry = Box::new(policy);
        self
    }

    #[must_use]
    pub fn resume_policy(mut self, policy: impl ResumePolicy) -> Self {
        self.options.resume = Box::new(policy);
        self
    }

    /// How often the worker re-checks the active file against the age
    /// ceiling while waiting for other work.
    #[must_use]
    pub fn age_check_interval(mut self, interval: Duration) -> Self {
        self.options.age_check_interval = interval;
        self
    }

    /// Validates the storage directory, recovers leftover files, spawns
    /// the background worker, and hands finalized files to `processor`.
    pub fn build(self, processor: impl FileProcessor) -> Result<FileStorageQueue> {
        FileStorageQueue::new(self.options, Box::new(processor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = FsqBuilder::new("/tmp/fsq");
        assert_eq!(builder.options.dir, PathBuf::from("/tmp/fsq"));
        assert_eq!(
            builder.options.age_check_interval,
            DEFAULT_AGE_CHECK_INTERVAL
        );
    }

    #[test]
    fn test_builder_overrides() {
        let builder = FsqBuilder::new("/tmp/fsq")
            .separator("\n")
            .age_check_interval(Duration::from_millis(50));
        assert_eq!(
            builder.options.age_check_interval,
            Duration::from_millis(50)
        );
    }
}
