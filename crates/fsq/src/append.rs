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

//! How a message is framed into the active file.

use std::io::{self, Write};

/// Writes one message into the active file.
///
/// Implementations must be pure apart from the write itself:
/// [`framed_len`](AppendStrategy::framed_len) is used for pre-append
/// finalization checks and must match what
/// [`append`](AppendStrategy::append) will write.
pub trait AppendStrategy: Send + Sync + 'static {
    /// Writes `payload` (plus any framing) into `w`, returning the number
    /// of bytes written.
    fn append(&self, w: &mut dyn Write, payload: &[u8]) -> io::Result<u64>;

    /// On-disk size of a framed message with a `payload_len`-byte payload.
    fn framed_len(&self, payload_len: usize) -> u64;
}

/// Appends payload bytes as-is. Suitable for self-delimiting encodings.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawAppend;

impl AppendStrategy for RawAppend {
    fn append(&self, w: &mut dyn Write, payload: &[u8]) -> io::Result<u64> {
        w.write_all(payload)?;
        Ok(payload.len() as u64)
    }

    fn framed_len(&self, payload_len: usize) -> u64 { payload_len as u64 }
}

/// Appends the payload followed by a fixed separator.
#[derive(Debug, Clone)]
pub struct SeparatorAppend {
    separator: Vec<u8>,
}

impl SeparatorAppend {
    pub fn new(separator: impl Into<Vec<u8>>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Newline-separated messages, one per line.
    #[must_use]
    pub fn newline() -> Self { Self::new(&b"\n"[..]) }
}

impl AppendStrategy for SeparatorAppend {
    fn append(&self, w: &mut dyn Write, payload: &[u8]) -> io::Result<u64> {
        w.write_all(payload)?;
        w.write_all(&self.separator)?;
        Ok((payload.len() + self.separator.len()) as u64)
    }

    fn framed_len(&self, payload_len: usize) -> u64 {
        (payload_len + self.separator.len()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_append() {
        let mut out = Vec::new();
        let written = RawAppend.append(&mut out, b"abc").unwrap();
        assert_eq!(written, 3);
        assert_eq!(out, b"abc");
        assert_eq!(RawAppend.framed_len(3), 3);
    }

    #[test]
    fn test_separator_append() {
        let strategy = SeparatorAppend::newline();
        let mut out = Vec::new();
        let mut written = strategy.append(&mut out, b"this is").unwrap();
        written += strategy.append(&mut out, b"a test").unwrap();
        assert_eq!(written, 15);
        assert_eq!(out, b"this is\na test\n");
        assert_eq!(strategy.framed_len(6), 7);
    }
}
