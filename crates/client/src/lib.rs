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

//! Front-end telemetry logging API.
//!
//! A [`TelemetryClient`] timestamps and serializes typed events and hands
//! the bytes to a durable [file storage queue](courier_fsq). The upload
//! side stays outside this crate: the caller injects a
//! [`FileProcessor`](courier_fsq::FileProcessor) that consumes finalized
//! files and reports whether they were delivered.
//!
//! ```ignore
//! use courier_client::TelemetryClientBuilder;
//! use courier_fsq::FileProcessingResult;
//!
//! let client = TelemetryClientBuilder::new("/var/lib/app/telemetry")
//!     .client_id("C3A8D5E1")
//!     .build(|file: &courier_fsq::FileInfo, _now: u64| {
//!         // POST file.path to the collection server, then:
//!         FileProcessingResult::Success
//!     })?;
//!
//! client.log_event("app_start")?;
//! client.log_event_with_value("screen_shown", "settings")?;
//! client.upload_now()?;
//! # courier_client::Result::Ok(())
//! ```

mod client;

pub use client::{ClientError, Result, TelemetryClient, TelemetryClientBuilder};
