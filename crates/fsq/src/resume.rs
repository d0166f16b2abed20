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

//! Whether a leftover active file is reused at startup.
//!
//! The predicate is evaluated exactly once, against the single most recent
//! active-shaped file found on disk. Older leftovers are always finalized
//! regardless of the policy, so startup ends with zero or one active file.

/// Startup decision for the most recent leftover active file.
pub trait ResumePolicy: Send + Sync + 'static {
    fn should_resume(&self) -> bool;
}

/// Keep appending to the leftover file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResumeByDefault;

impl ResumePolicy for ResumeByDefault {
    fn should_resume(&self) -> bool { true }
}

/// Finalize the leftover file immediately. Simplifies crash-recovery tests
/// and suits callers that want every restart to start a fresh file.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverResume;

impl ResumePolicy for NeverResume {
    fn should_resume(&self) -> bool { false }
}
