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

//! When to drop old finalized files.
//!
//! Local storage must stay bounded even when the upload side is down for
//! days. The queue evicts oldest-first, one file at a time, while the
//! policy keeps reporting the backlog as over its ceilings. Eviction is
//! data loss by choice; newest data survives.

/// Decides whether the finalized backlog exceeds its storage ceilings.
pub trait PurgePolicy: Send + Sync + 'static {
    fn should_purge(&self, total_bytes: u64, file_count: usize) -> bool;
}

/// Byte and file-count caps on the finalized backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapPurgePolicy {
    pub max_total_bytes: u64,
    pub max_files:       usize,
}

impl Default for CapPurgePolicy {
    fn default() -> Self {
        Self {
            max_total_bytes: 64 * 1024 * 1024,
            max_files:       1000,
        }
    }
}

impl PurgePolicy for CapPurgePolicy {
    fn should_purge(&self, total_bytes: u64, file_count: usize) -> bool {
        total_bytes > self.max_total_bytes || file_count > self.max_files
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(1000, 3, false ; "at both caps is fine")]
    #[test_case(1001, 3, true ; "over byte cap purges")]
    #[test_case(999, 4, true ; "over file cap purges")]
    #[test_case(0, 0, false ; "empty backlog never purges")]
    fn test_cap_policy(total_bytes: u64, file_count: usize, expected: bool) {
        let policy = CapPurgePolicy {
            max_total_bytes: 1000,
            max_files:       3,
        };
        assert_eq!(policy.should_purge(total_bytes, file_count), expected);
    }
}
