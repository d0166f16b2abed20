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

//! The external consumer of finalized files.
//!
//! The queue decides WHEN a finalized file is handed over; the processor
//! owns WHAT happens to it (typically an upload) and answers with a
//! [`FileProcessingResult`]. The verdict is a first-class value — the
//! dominant failure path in the system — and is never modeled as an error.

use crate::file::FileInfo;

/// Processor verdict for one finalized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileProcessingResult {
    /// The file was consumed; delete it and continue with the next one
    /// immediately.
    Success,

    /// The processor itself is not ready (total outage, missing
    /// configuration). Processing halts entirely until the next wake —
    /// a new finalized file or an explicit force. No retry timer runs.
    Unavailable,

    /// This attempt failed; keep the file at the head of the queue and
    /// retry it after the backoff computed by the retry policy.
    FailureNeedRetry,
}

/// Consumes finalized files, oldest first.
///
/// `now_ms` is the queue clock's value at invocation time, not the wall
/// clock, so processors stay deterministic under test clocks.
pub trait FileProcessor: Send + 'static {
    fn on_file_ready(&mut self, file: &FileInfo, now_ms: u64) -> FileProcessingResult;
}

impl<F> FileProcessor for F
where
    F: FnMut(&FileInfo, u64) -> FileProcessingResult + Send + 'static,
{
    fn on_file_ready(&mut self, file: &FileInfo, now_ms: u64) -> FileProcessingResult {
        self(file, now_ms)
    }
}
