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

//! When to seal the active file.
//!
//! The policy is consulted with the PROJECTED file size (current bytes plus
//! the message about to be appended), so the message that crosses a size
//! ceiling seals the file containing everything before it and itself opens
//! the next file. It is also consulted on a periodic age tick, with a
//! projected size of zero so only the age ceiling can trigger there.
//!
//! Two ceiling tiers apply depending on backlog: when the finalized queue
//! is empty, a small ceiling keeps delivery latency low; when files are
//! already waiting, a larger ceiling avoids shredding a backlog into many
//! tiny files.

/// A size/age ceiling pair. Crossing either seals the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeCeiling {
    pub max_bytes:  u64,
    pub max_age_ms: u64,
}

/// Decides whether the active file should be sealed now.
pub trait FinalizePolicy: Send + Sync + 'static {
    fn should_finalize(&self, projected_size: u64, age_ms: u64, has_backlog: bool) -> bool;
}

/// Ceiling-based policy with separate tiers for the empty-backlog and
/// with-backlog cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdFinalizePolicy {
    pub no_backlog:   FinalizeCeiling,
    pub with_backlog: FinalizeCeiling,
}

impl Default for ThresholdFinalizePolicy {
    fn default() -> Self {
        Self {
            no_backlog:   FinalizeCeiling {
                max_bytes:  128 * 1024,
                max_age_ms: 2 * 60 * 1000,
            },
            with_backlog: FinalizeCeiling {
                max_bytes:  1024 * 1024,
                max_age_ms: 60 * 60 * 1000,
            },
        }
    }
}

impl FinalizePolicy for ThresholdFinalizePolicy {
    fn should_finalize(&self, projected_size: u64, age_ms: u64, has_backlog: bool) -> bool {
        let ceiling = if has_backlog {
            &self.with_backlog
        } else {
            &self.no_backlog
        };
        projected_size > ceiling.max_bytes || age_ms > ceiling.max_age_ms
    }
}
