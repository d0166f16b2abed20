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

//! Logs a few events and "uploads" them to stdout.
//!
//! ```sh
//! cargo run -p courier-client --example telemetry_demo
//! ```

use std::collections::BTreeMap;

use courier_client::TelemetryClientBuilder;
use courier_events::decode_event_stream;
use courier_fsq::{FileInfo, FileProcessingResult};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let dir = std::env::temp_dir().join("courier-telemetry-demo");

    let client = TelemetryClientBuilder::new(&dir)
        .client_id("DEMO-CLIENT")
        .build(|file: &FileInfo, now: u64| {
            let bytes = match std::fs::read(&file.path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    eprintln!("failed to read {}: {e}", file.name);
                    return FileProcessingResult::FailureNeedRetry;
                }
            };
            println!("-- uploading {} ({} bytes) at t={now}", file.name, file.size);
            match decode_event_stream(&bytes) {
                Ok(events) => {
                    for event in events {
                        println!("   {event:?}");
                    }
                }
                Err(e) => eprintln!("   undecodable payload: {e}"),
            }
            FileProcessingResult::Success
        })?;

    client.log_event("app_start")?;
    client.log_event_with_value("screen_shown", "settings")?;
    client.log_event_with_pairs(
        "search",
        BTreeMap::from([
            ("query".to_string(), "coffee".to_string()),
            ("results".to_string(), "12".to_string()),
        ]),
    )?;

    client.upload_now()?;
    std::thread::sleep(std::time::Duration::from_millis(200));
    client.shutdown()?;
    Ok(())
}
