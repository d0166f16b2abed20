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

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use courier_events::{Event, encode_event};
use courier_fsq::{
    Clock, FileProcessor, FileStorageQueue, FsqBuilder, QueueStatus, SystemClock,
};
use snafu::{ResultExt, Snafu};
use tracing::warn;

/// Telemetry client errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    #[snafu(display("failed to encode event: {source}"))]
    Encode { source: courier_events::EventError },

    #[snafu(display("failed to store event: {source}"))]
    Store { source: courier_fsq::QueueError },
}

/// Result type for telemetry client operations.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Builder for [`TelemetryClient`].
pub struct TelemetryClientBuilder {
    dir:       PathBuf,
    client_id: Option<String>,
    clock:     Arc<dyn Clock>,
}

impl TelemetryClientBuilder {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir:       dir.into(),
            client_id: None,
            clock:     Arc::new(SystemClock),
        }
    }

    /// Unique client/installation id, logged as the first event so it
    /// lands at the head of the first file a fresh client produces.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the client over a queue in `dir`, handing finalized files to
    /// `processor`.
    ///
    /// Events are bincode-encoded and self-delimiting, so the queue
    /// appends them raw; no separator framing is configured.
    pub fn build(self, processor: impl FileProcessor) -> Result<TelemetryClient> {
        let queue = FsqBuilder::new(self.dir)
            .clock(self.clock.clone())
            .build(processor)
            .context(StoreSnafu)?;

        let client = TelemetryClient {
            queue,
            clock: self.clock,
        };
        if let Some(id) = self.client_id {
            client.log(Event::ClientId {
                timestamp_ms: client.clock.now_ms(),
                id,
            })?;
        }
        Ok(client)
    }
}

/// Logs typed events into a durable local queue for eventual upload.
///
/// Cheap to call from any thread; appends go through the queue's producer
/// lock and never wait on the upload side.
pub struct TelemetryClient {
    queue: FileStorageQueue,
    clock: Arc<dyn Clock>,
}

impl TelemetryClient {
    /// Logs a bare named event.
    pub fn log_event(&self, name: impl Into<String>) -> Result<()> {
        self.log(Event::Named {
            timestamp_ms: self.clock.now_ms(),
            name:         name.into(),
        })
    }

    /// Logs a named event with one value.
    pub fn log_event_with_value(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.log(Event::KeyValue {
            timestamp_ms: self.clock.now_ms(),
            name:         name.into(),
            value:        value.into(),
        })
    }

    /// Logs a named event with key/value attributes.
    pub fn log_event_with_pairs(
        &self,
        name: impl Into<String>,
        pairs: BTreeMap<String, String>,
    ) -> Result<()> {
        self.log(Event::KeyPairs {
            timestamp_ms: self.clock.now_ms(),
            name: name.into(),
            pairs,
        })
    }

    /// Logs an already-constructed event.
    pub fn log(&self, event: Event) -> Result<()> {
        let bytes = encode_event(&event).context(EncodeSnafu)?;
        self.queue
            .push_message(bytes)
            .inspect_err(|e| warn!(error = %e, "Dropping event, queue rejected it"))
            .context(StoreSnafu)
    }

    /// Seals the current file and asks the upload side to drain the whole
    /// backlog now, ignoring any retry backoff.
    pub fn upload_now(&self) -> Result<()> {
        self.queue.force_processing().context(StoreSnafu)
    }

    /// Snapshot of the underlying queue.
    #[must_use]
    pub fn status(&self) -> QueueStatus { self.queue.status() }

    /// Stops the background upload loop gracefully.
    pub fn shutdown(self) -> Result<()> { self.queue.shutdown().context(StoreSnafu) }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use courier_events::decode_event_stream;
    use courier_fsq::{FileInfo, FileProcessingResult, ManualClock};
    use crossbeam::channel::unbounded;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_logged_events_reach_the_processor_decodable() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(1_000));
        let (uploads_tx, uploads_rx) = unbounded::<Vec<u8>>();

        let client = TelemetryClientBuilder::new(temp_dir.path())
            .client_id("C3A8D5E1")
            .clock(clock.clone())
            .build(move |file: &FileInfo, _now: u64| {
                let bytes = std::fs::read(&file.path).unwrap();
                uploads_tx.send(bytes).unwrap();
                FileProcessingResult::Success
            })
            .unwrap();

        client.log_event("app_start").unwrap();
        clock.set(1_001);
        client
            .log_event_with_value("screen_shown", "settings")
            .unwrap();
        clock.set(1_002);
        client
            .log_event_with_pairs(
                "search",
                BTreeMap::from([("query".to_string(), "coffee".to_string())]),
            )
            .unwrap();

        client.upload_now().unwrap();
        let bytes = uploads_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("upload");

        let events = decode_event_stream(&bytes).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            Event::ClientId {
                timestamp_ms: 1_000,
                id:           "C3A8D5E1".into(),
            }
        );
        assert_eq!(
            events[1],
            Event::Named {
                timestamp_ms: 1_000,
                name:         "app_start".into(),
            }
        );
        assert_eq!(events[3].timestamp_ms(), 1_002);

        client.shutdown().unwrap();
    }

    #[test]
    fn test_status_reflects_buffered_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let client = TelemetryClientBuilder::new(temp_dir.path())
            .build(|_: &FileInfo, _: u64| FileProcessingResult::Success)
            .unwrap();

        assert_eq!(client.status().appended_file_size, 0);
        client.log_event("something").unwrap();
        assert!(client.status().appended_file_size > 0);

        client.shutdown().unwrap();
    }
}
