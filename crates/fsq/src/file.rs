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

//! The active file and the finalized-file descriptor.
//!
//! An [`ActiveFile`] is the single file currently accepting appended
//! messages. It is exclusively owned by the queue and mutated only under
//! the producer lock. Sealing consumes it: the handle is closed, the file
//! is renamed under the `finalized-` prefix (keeping its embedded
//! timestamp), and a [`FileInfo`] joins the finalized queue. Finalized
//! files are immutable; they are only ever read and deleted.

use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use crate::{
    append::AppendStrategy,
    path::{active_file_name, finalized_file_name},
};

/// Descriptor of a finalized file, as handed to processors and reported in
/// status snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Short file name, e.g. `finalized-00000000000000000101.bin`.
    pub name:         String,
    /// Full path within the queue directory.
    pub path:         PathBuf,
    /// Size in bytes.
    pub size:         u64,
    /// Timestamp of the first message in the file, epoch milliseconds.
    pub timestamp_ms: u64,
}

/// The file currently accepting appends.
pub(crate) struct ActiveFile {
    file:           File,
    path:           PathBuf,
    timestamp_ms:   u64,
    size:           u64,
    last_append_ms: u64,
}

impl ActiveFile {
    /// Creates a fresh active file named after `now_ms`.
    ///
    /// If a file for that exact millisecond already exists the timestamp is
    /// bumped until a free name is found, keeping embedded timestamps
    /// unique within the directory.
    pub fn create(dir: &Path, now_ms: u64) -> io::Result<Self> {
        let mut timestamp_ms = now_ms;
        loop {
            let path = dir.join(active_file_name(timestamp_ms));
            match OpenOptions::new().append(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(Self {
                        file,
                        path,
                        timestamp_ms,
                        size: 0,
                        last_append_ms: now_ms,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    timestamp_ms += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Reopens a leftover active file from a previous run for appending.
    pub fn resume(path: PathBuf, timestamp_ms: u64, now_ms: u64) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file,
            path,
            timestamp_ms,
            size,
            last_append_ms: now_ms,
        })
    }

    /// Appends one message through the configured strategy.
    pub fn append(
        &mut self,
        strategy: &dyn AppendStrategy,
        payload: &[u8],
        now_ms: u64,
    ) -> io::Result<u64> {
        let written = strategy.append(&mut self.file, payload)?;
        self.size += written;
        self.last_append_ms = now_ms;
        Ok(written)
    }

    /// Closes the handle and renames the file under the `finalized-`
    /// prefix, preserving the embedded first-message timestamp.
    pub fn seal(self) -> io::Result<FileInfo> {
        let Self {
            file,
            path,
            timestamp_ms,
            size,
            ..
        } = self;
        drop(file);

        let dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        let mut sealed_ts = timestamp_ms;
        let mut target = dir.join(finalized_file_name(sealed_ts));
        // A finalized file with this timestamp can linger from a previous
        // run; bump rather than clobber it.
        while target.exists() {
            sealed_ts += 1;
            target = dir.join(finalized_file_name(sealed_ts));
        }
        std::fs::rename(&path, &target)?;

        Ok(FileInfo {
            name: finalized_file_name(sealed_ts),
            path: target,
            size,
            timestamp_ms: sealed_ts,
        })
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn size(&self) -> u64 { self.size }

    pub fn timestamp_ms(&self) -> u64 { self.timestamp_ms }

    pub fn last_append_ms(&self) -> u64 { self.last_append_ms }
}
