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

//! Point-in-time queue introspection.

use crate::file::FileInfo;

/// The finalized side of a [`QueueStatus`] snapshot.
#[derive(Debug, Clone, Default)]
pub struct FinalizedFilesStatus {
    /// Finalized files in processing order, oldest first.
    pub queue:      Vec<FileInfo>,
    /// Sum of the sizes in `queue`.
    pub total_size: u64,
}

/// Snapshot of the queue taken under the producer lock, reflecting the
/// state at the instant of the call. Never cached.
#[derive(Debug, Clone, Default)]
pub struct QueueStatus {
    /// Bytes accumulated in the active file, 0 if none exists.
    pub appended_file_size: u64,
    /// The finalized backlog.
    pub finalized:          FinalizedFilesStatus,
}
