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

//! Typed telemetry events and their binary encoding.
//!
//! Every event carries its own UTC-millisecond timestamp, taken when the
//! application logged it, not when the bytes reached disk or the server.
//! Events are encoded with bincode; the encoding is self-delimiting, so a
//! telemetry file is simply encoded events written back to back and
//! [`decode_event_stream`] walks the concatenation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

/// One logged telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Unique client/installation id. Logged first so it lands at the head
    /// of the first file a fresh client produces.
    ClientId { timestamp_ms: u64, id: String },

    /// A bare named occurrence.
    Named { timestamp_ms: u64, name: String },

    /// A named occurrence with one value.
    KeyValue {
        timestamp_ms: u64,
        name:         String,
        value:        String,
    },

    /// A named occurrence with arbitrary key/value attributes.
    KeyPairs {
        timestamp_ms: u64,
        name:         String,
        pairs:        BTreeMap<String, String>,
    },
}

impl Event {
    /// When the application logged this event, epoch milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            Self::ClientId { timestamp_ms, .. }
            | Self::Named { timestamp_ms, .. }
            | Self::KeyValue { timestamp_ms, .. }
            | Self::KeyPairs { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

/// Event encoding/decoding errors.
#[derive(Debug, Snafu)]
pub enum EventError {
    #[snafu(display("failed to encode event: {source}"))]
    Encode { source: bincode::error::EncodeError },

    #[snafu(display("failed to decode event: {source}"))]
    Decode { source: bincode::error::DecodeError },
}

/// Result type for event codec operations.
pub type Result<T, E = EventError> = std::result::Result<T, E>;

/// Encodes one event to its binary form.
pub fn encode_event(event: &Event) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(event, bincode::config::standard()).context(EncodeSnafu)
}

/// Decodes one event from the front of `bytes`, returning it along with
/// the number of bytes consumed.
pub fn decode_event(bytes: &[u8]) -> Result<(Event, usize)> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard()).context(DecodeSnafu)
}

/// Decodes a concatenation of encoded events, as found in a telemetry
/// file. Fails on the first corrupt entry.
pub fn decode_event_stream(mut bytes: &[u8]) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    while !bytes.is_empty() {
        let (event, consumed) = decode_event(bytes)?;
        events.push(event);
        bytes = &bytes[consumed..];
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> Vec<Event> {
        vec![
            Event::ClientId {
                timestamp_ms: 1,
                id:           "C3A8D5E1".into(),
            },
            Event::Named {
                timestamp_ms: 2,
                name:         "app_start".into(),
            },
            Event::KeyValue {
                timestamp_ms: 3,
                name:         "screen_shown".into(),
                value:        "settings".into(),
            },
            Event::KeyPairs {
                timestamp_ms: 4,
                name:         "search".into(),
                pairs:        BTreeMap::from([
                    ("query".to_string(), "coffee".to_string()),
                    ("results".to_string(), "12".to_string()),
                ]),
            },
        ]
    }

    #[test]
    fn test_stream_round_trip() {
        let events = sample_events();
        let mut buffer = Vec::new();
        for event in &events {
            buffer.extend(encode_event(event).unwrap());
        }

        let decoded = decode_event_stream(&buffer).unwrap();
        assert_eq!(decoded, events);
    }

    #[test]
    fn test_timestamp_accessor() {
        for (i, event) in sample_events().iter().enumerate() {
            assert_eq!(event.timestamp_ms(), i as u64 + 1);
        }
    }

    #[test]
    fn test_truncated_stream_is_an_error() {
        let bytes = encode_event(&sample_events()[3]).unwrap();
        assert!(decode_event_stream(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_empty_stream_decodes_to_nothing() {
        assert!(decode_event_stream(&[]).unwrap().is_empty());
    }
}
