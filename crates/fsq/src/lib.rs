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

//! Durable, crash-resilient, disk-backed store-and-forward queue.
//!
//! Sits between "an event happened" and "the event was uploaded":
//! producers append serialized messages to an active file; size/age
//! ceilings seal it into an immutable finalized file; a background worker
//! hands finalized files, oldest first, to an injected
//! [`FileProcessor`] and reacts to its verdict with deletion, jittered
//! retry backoff, or a halt. Storage ceilings bound local disk usage by
//! evicting the oldest backlog.
//!
//! Every policy — append framing, finalization, purge, retry, resume, and
//! the clock — is a trait injected at construction, so the whole state
//! machine is testable with a manual clock and an in-process processor.
//!
//! ```ignore
//! use courier_fsq::{FileProcessingResult, FsqBuilder};
//!
//! let queue = FsqBuilder::new("/var/lib/app/telemetry")
//!     .separator("\n")
//!     .build(|file: &courier_fsq::FileInfo, _now: u64| {
//!         // upload `file.path`, then:
//!         FileProcessingResult::Success
//!     })?;
//!
//! queue.push_message("event bytes")?;
//! queue.force_processing()?;
//! # courier_fsq::Result::Ok(())
//! ```

pub mod append;
pub mod builder;
pub mod clock;
pub mod error;
pub mod file;
pub mod finalize;
pub mod path;
pub mod processor;
pub mod purge;
mod queue;
pub mod resume;
pub mod retry;
pub mod status;

pub use append::{AppendStrategy, RawAppend, SeparatorAppend};
pub use builder::FsqBuilder;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{QueueError, Result};
pub use file::FileInfo;
pub use finalize::{FinalizeCeiling, FinalizePolicy, ThresholdFinalizePolicy};
pub use processor::{FileProcessingResult, FileProcessor};
pub use purge::{CapPurgePolicy, PurgePolicy};
pub use queue::FileStorageQueue;
pub use resume::{NeverResume, ResumeByDefault, ResumePolicy};
pub use retry::{BackoffParams, ExponentialBackoff, ImmediateRetry, RetryPolicy};
pub use status::{FinalizedFilesStatus, QueueStatus};
