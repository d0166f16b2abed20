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

use std::{io, path::PathBuf};

use snafu::Snafu;

/// Queue operation errors.
///
/// Only filesystem operations can fail; the strategy objects are pure and
/// non-throwing. Processor verdicts are ordinary values
/// ([`FileProcessingResult`](crate::FileProcessingResult)), never errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueueError {
    /// The storage directory could not be created or is not writable.
    /// Fatal at construction time; the queue is not created.
    #[snafu(display("storage directory {} is not usable: {source}", path.display()))]
    StorageDir { path: PathBuf, source: io::Error },

    /// Listing the storage directory failed.
    #[snafu(display("failed to scan storage directory {}: {source}", path.display()))]
    ScanDir { path: PathBuf, source: io::Error },

    /// Creating a fresh active file failed.
    #[snafu(display("failed to create active file {}: {source}", path.display()))]
    CreateActive { path: PathBuf, source: io::Error },

    /// Appending a message to the active file failed.
    #[snafu(display("failed to append to active file {}: {source}", path.display()))]
    Append { path: PathBuf, source: io::Error },

    /// Renaming the active file into the finalized queue failed.
    #[snafu(display(
        "failed to finalize {} as {}: {source}",
        from.display(),
        to.display()
    ))]
    Finalize {
        from:   PathBuf,
        to:     PathBuf,
        source: io::Error,
    },

    /// Deleting a queue file failed.
    #[snafu(display("failed to remove {}: {source}", path.display()))]
    Remove { path: PathBuf, source: io::Error },

    /// Spawning the background worker thread failed.
    #[snafu(display("failed to spawn queue worker thread: {source}"))]
    WorkerSpawn { source: io::Error },

    /// The queue has been shut down and no longer accepts messages.
    #[snafu(display("queue is shut down"))]
    ShutDown,

    /// The background worker thread panicked.
    #[snafu(display("background worker thread panicked"))]
    WorkerPanicked,
}

/// Result type for queue operations.
pub type Result<T, E = QueueError> = std::result::Result<T, E>;
