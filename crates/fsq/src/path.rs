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

//! Queue file naming and directory scanning.
//!
//! File names embed the timestamp of the first message written into the
//! file as a fixed-width, zero-padded decimal, so a plain lexicographic
//! sort of the directory listing reconstructs chronological order after a
//! crash. No separate index file exists; the directory IS the queue state.
//!
//! - Active file:    `current-<timestamp>.bin`
//! - Finalized file: `finalized-<timestamp>.bin`

use std::{
    fs,
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use tracing::warn;

use crate::{Result, error::ScanDirSnafu};

pub const ACTIVE_PREFIX: &str = "current-";
pub const FINALIZED_PREFIX: &str = "finalized-";
pub const FILE_SUFFIX: &str = ".bin";

/// Width of the embedded decimal timestamp. 20 digits fit any `u64`, so
/// padding never truncates and sort order never flips.
pub const TIMESTAMP_WIDTH: usize = 20;

/// Name for an active file whose first message arrived at `timestamp_ms`.
#[must_use]
pub fn active_file_name(timestamp_ms: u64) -> String {
    format!("{ACTIVE_PREFIX}{timestamp_ms:020}{FILE_SUFFIX}")
}

/// Name for a finalized file, preserving the active file's timestamp.
#[must_use]
pub fn finalized_file_name(timestamp_ms: u64) -> String {
    format!("{FINALIZED_PREFIX}{timestamp_ms:020}{FILE_SUFFIX}")
}

/// Extracts the timestamp from an active file name, if it is one.
#[must_use]
pub fn parse_active_file_name(name: &str) -> Option<u64> { parse(name, ACTIVE_PREFIX) }

/// Extracts the timestamp from a finalized file name, if it is one.
#[must_use]
pub fn parse_finalized_file_name(name: &str) -> Option<u64> { parse(name, FINALIZED_PREFIX) }

fn parse(name: &str, prefix: &str) -> Option<u64> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(FILE_SUFFIX)?;
    if digits.len() != TIMESTAMP_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// A queue file discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub timestamp_ms: u64,
    pub path:         PathBuf,
}

/// Result of scanning a queue directory at startup.
#[derive(Debug, Default)]
pub struct ScannedDir {
    /// Leftover active-shaped files, oldest first.
    pub active:    Vec<ScannedFile>,
    /// Finalized files, oldest first.
    pub finalized: Vec<ScannedFile>,
}

/// Scans `dir` for queue files, sorted oldest-first within each kind.
///
/// Entries that carry a queue prefix but do not parse as a well-formed
/// queue file name are skipped with a warning; anything else in the
/// directory is silently ignored.
pub fn scan_queue_dir(dir: &Path) -> Result<ScannedDir> {
    let mut scanned = ScannedDir::default();

    for entry in fs::read_dir(dir).context(ScanDirSnafu { path: dir })? {
        let entry = entry.context(ScanDirSnafu { path: dir })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some(timestamp_ms) = parse_active_file_name(name) {
            scanned.active.push(ScannedFile { timestamp_ms, path });
        } else if let Some(timestamp_ms) = parse_finalized_file_name(name) {
            scanned.finalized.push(ScannedFile { timestamp_ms, path });
        } else if name.starts_with(ACTIVE_PREFIX) || name.starts_with(FINALIZED_PREFIX) {
            warn!(file = %name, "Skipping malformed queue file name");
        }
    }

    scanned.active.sort_by_key(|f| f.timestamp_ms);
    scanned.finalized.sort_by_key(|f| f.timestamp_ms);
    Ok(scanned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_are_fixed_width() {
        assert_eq!(active_file_name(101), "current-00000000000000000101.bin");
        assert_eq!(
            finalized_file_name(101),
            "finalized-00000000000000000101.bin"
        );
        assert_eq!(
            finalized_file_name(u64::MAX),
            format!("finalized-{}.bin", u64::MAX)
        );
    }

    #[test]
    fn test_lexicographic_order_equals_chronological() {
        let older = finalized_file_name(999);
        let newer = finalized_file_name(1000);
        assert!(older < newer);
    }

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(parse_active_file_name(&active_file_name(42)), Some(42));
        assert_eq!(
            parse_finalized_file_name(&finalized_file_name(42)),
            Some(42)
        );
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        assert_eq!(parse_active_file_name("current-123.bin"), None);
        assert_eq!(parse_active_file_name("current-00000000000000000101"), None);
        assert_eq!(
            parse_active_file_name("finalized-00000000000000000101.bin"),
            None
        );
        assert_eq!(
            parse_finalized_file_name("finalized-0000000000000000x101.bin"),
            None
        );
    }

    #[test]
    fn test_scan_sorts_and_filters() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path();

        for name in [
            &finalized_file_name(3),
            &finalized_file_name(1),
            &active_file_name(2),
            "unrelated.txt",
            "current-bogus.bin",
        ] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let scanned = scan_queue_dir(dir).unwrap();
        assert_eq!(scanned.active.len(), 1);
        assert_eq!(scanned.active[0].timestamp_ms, 2);
        assert_eq!(scanned.finalized.len(), 2);
        assert_eq!(scanned.finalized[0].timestamp_ms, 1);
        assert_eq!(scanned.finalized[1].timestamp_ms, 3);
    }
}
