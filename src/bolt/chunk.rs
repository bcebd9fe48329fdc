// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bolt's chunked framing (section 4.2): every message is split into
//! u16-length-prefixed chunks of at most 65535 bytes, terminated by an empty
//! (`00 00`) chunk.
//!
//! Unlike the teacher's `Dechunker`, which wraps a blocking `Read` and pulls
//! bytes on demand, [`Accumulator`] is fed whatever the transport happened to
//! return from one `read` call and reports back whatever complete messages
//! that yielded. This mirrors the PackStream decoder's streaming-tolerant
//! contract and keeps all blocking I/O at the transport boundary (section
//! 4.4's "reading with buffering" requirement).

const MAX_CHUNK_SIZE: usize = u16::MAX as usize;

/// Splits `payload` into wire-ready chunks, terminated by the empty chunk.
pub(crate) fn chunk_message(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + payload.len() / MAX_CHUNK_SIZE * 2 + 4);
    if payload.is_empty() {
        out.extend_from_slice(&0u16.to_be_bytes());
        return out;
    }
    for window in payload.chunks(MAX_CHUNK_SIZE) {
        out.extend_from_slice(&(window.len() as u16).to_be_bytes());
        out.extend_from_slice(window);
    }
    out.extend_from_slice(&0u16.to_be_bytes());
    out
}

/// Incrementally reassembles chunked messages out of raw bytes fed to it as
/// they arrive off the wire.
///
/// `feed` never blocks and never errors: malformed framing cannot occur
/// because every chunk is length-prefixed, so the only possible states are
/// "not enough bytes yet" and "one or more complete messages are ready".
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    buf: Vec<u8>,
    message: Vec<u8>,
}

impl Accumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends freshly-read bytes to the internal buffer.
    pub(crate) fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pulls the next complete message out of whatever has been fed so far,
    /// if one is fully buffered. Partially-buffered chunks are left in place
    /// for the next call.
    pub(crate) fn next_message(&mut self) -> Option<Vec<u8>> {
        let mut pos = 0;
        loop {
            if self.buf.len() < pos + 2 {
                return None;
            }
            let size = u16::from_be_bytes([self.buf[pos], self.buf[pos + 1]]) as usize;
            if size == 0 {
                let message = std::mem::take(&mut self.message);
                self.buf.drain(..pos + 2);
                return Some(message);
            }
            if self.buf.len() < pos + 2 + size {
                return None;
            }
            self.message
                .extend_from_slice(&self.buf[pos + 2..pos + 2 + size]);
            pos += 2 + size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_message_terminates_with_empty_chunk() {
        let out = chunk_message(&[1, 2, 3]);
        assert_eq!(out, vec![0, 3, 1, 2, 3, 0, 0]);
    }

    #[test]
    fn chunk_message_splits_oversized_payloads() {
        let payload = vec![0xAB; MAX_CHUNK_SIZE + 10];
        let out = chunk_message(&payload);
        assert_eq!(&out[0..2], &(MAX_CHUNK_SIZE as u16).to_be_bytes());
        let second_chunk_size_at = 2 + MAX_CHUNK_SIZE;
        assert_eq!(&out[second_chunk_size_at..second_chunk_size_at + 2], &10u16.to_be_bytes());
        assert_eq!(&out[out.len() - 2..], &[0, 0]);
    }

    #[test]
    fn empty_payload_chunks_to_just_the_terminator() {
        assert_eq!(chunk_message(&[]), vec![0, 0]);
    }

    #[test]
    fn accumulator_reassembles_a_single_chunk_message() {
        let mut acc = Accumulator::new();
        acc.feed(&chunk_message(&[1, 2, 3]));
        assert_eq!(acc.next_message(), Some(vec![1, 2, 3]));
        assert_eq!(acc.next_message(), None);
    }

    #[test]
    fn accumulator_returns_none_until_a_message_is_fully_buffered() {
        let mut acc = Accumulator::new();
        let full = chunk_message(&[1, 2, 3, 4]);
        acc.feed(&full[..3]);
        assert_eq!(acc.next_message(), None);
        acc.feed(&full[3..]);
        assert_eq!(acc.next_message(), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn accumulator_reassembles_multi_chunk_message() {
        let mut acc = Accumulator::new();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&[1, 2]);
        bytes.extend_from_slice(&3u16.to_be_bytes());
        bytes.extend_from_slice(&[3, 4, 5]);
        bytes.extend_from_slice(&0u16.to_be_bytes());
        acc.feed(&bytes);
        assert_eq!(acc.next_message(), Some(vec![1, 2, 3, 4, 5]));
    }

    #[test]
    fn accumulator_handles_coalesced_back_to_back_messages() {
        let mut acc = Accumulator::new();
        acc.feed(&chunk_message(&[1]));
        acc.feed(&chunk_message(&[2, 3]));
        assert_eq!(acc.next_message(), Some(vec![1]));
        assert_eq!(acc.next_message(), Some(vec![2, 3]));
        assert_eq!(acc.next_message(), None);
    }

    #[test]
    fn accumulator_round_trips_an_empty_message() {
        let mut acc = Accumulator::new();
        acc.feed(&chunk_message(&[]));
        assert_eq!(acc.next_message(), Some(vec![]));
    }
}
