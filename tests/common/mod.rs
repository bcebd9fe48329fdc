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

//! Shared scripted-server transport for the cross-layer scenarios in
//! section 8 of `SPEC_FULL.md`. A real server is mimicked by queueing the
//! exact bytes it would send for a given exchange; nothing here talks to a
//! socket.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bolt_driver::bolt::Transport;
use bolt_driver::value::Value;

pub const SUCCESS: u8 = 0x70;
pub const FAILURE: u8 = 0x7F;
pub const RECORD: u8 = 0x71;

/// An in-memory duplex "socket": `to_client` is everything the scripted
/// server will ever send, `from_client` accumulates everything the
/// connection wrote. `read_calls` counts physical `Read::read` invocations
/// through a handle kept outside the transport itself (the transport is
/// moved into a `Connection` the moment a test hands it over), used by the
/// coalesced-packet scenario to show that a second message already sitting
/// in the receive buffer costs no extra read.
pub struct MockTransport {
    pub to_client: VecDeque<u8>,
    pub from_client: Vec<u8>,
    pub read_calls: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self::with_counter(bytes, Arc::new(AtomicUsize::new(0)))
    }

    pub fn with_counter(bytes: Vec<u8>, read_calls: Arc<AtomicUsize>) -> Self {
        Self {
            to_client: bytes.into(),
            from_client: Vec::new(),
            read_calls,
        }
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.to_client.is_empty() {
            return Ok(0);
        }
        let n = buf.len().min(self.to_client.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.to_client.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.from_client.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MockTransport {
    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn set_write_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) {}
}

pub fn chunk(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&[0, 0]);
    out
}

pub fn encode_chunked(value: &Value) -> Vec<u8> {
    chunk(&bolt_driver::packstream::encode(value).unwrap())
}

pub fn success(fields: Vec<(&str, Value)>) -> Value {
    Value::Structure {
        signature: SUCCESS,
        fields: vec![Value::Map(
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        )],
    }
}

pub fn failure(fields: Vec<(&str, Value)>) -> Value {
    Value::Structure {
        signature: FAILURE,
        fields: vec![Value::Map(
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        )],
    }
}

pub fn record(values: Vec<Value>) -> Value {
    Value::Structure {
        signature: RECORD,
        fields: vec![Value::List(values)],
    }
}

/// The 4-byte handshake reply naming Bolt 5.4, the version this crate
/// always offers first (`DESIGN.md`'s version-proposal decision).
pub fn handshake_reply() -> Vec<u8> {
    vec![0, 0, 4, 5]
}

pub fn hello_and_logon_success() -> Vec<u8> {
    let mut bytes = encode_chunked(&success(vec![]));
    bytes.extend(encode_chunked(&success(vec![])));
    bytes
}

/// Prepends the handshake reply to `script`, the convenience every scenario
/// needs since a fresh connection always starts with a handshake.
pub fn server_script(script: Vec<u8>) -> Vec<u8> {
    let mut bytes = handshake_reply();
    bytes.extend(script);
    bytes
}

pub fn empty_params() -> HashMap<String, Value> {
    HashMap::new()
}

/// A minimal stand-in server that actually speaks Bolt back: rather than a
/// fixed byte script, it decodes whatever the connection last wrote and
/// answers every request kind with a generic SUCCESS. Used by the pool
/// contention scenario, where the exact number of RUN/PULL cycles per
/// connection depends on which caller happens to grab it.
pub struct FakeServer {
    handshook: bool,
    from_client: Vec<u8>,
    pending_out: VecDeque<u8>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            handshook: false,
            from_client: Vec::new(),
            pending_out: VecDeque::new(),
        }
    }

    fn fill_pending(&mut self) {
        if !self.handshook {
            if self.from_client.len() >= 20 {
                self.from_client.drain(0..20);
                self.handshook = true;
                self.pending_out.extend(handshake_reply());
            }
            return;
        }
        if let Some(payload) = Self::extract_message(&mut self.from_client) {
            let (value, _) = bolt_driver::packstream::decode(&payload).unwrap();
            if let Value::Structure { signature, .. } = value {
                if let Some(reply) = Self::dispatch(signature) {
                    self.pending_out.extend(encode_chunked(&reply));
                }
            }
        }
    }

    fn extract_message(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
        let mut offset = 0;
        let mut payload = Vec::new();
        loop {
            if buf.len() < offset + 2 {
                return None;
            }
            let len = u16::from_be_bytes([buf[offset], buf[offset + 1]]) as usize;
            offset += 2;
            if len == 0 {
                buf.drain(0..offset);
                return Some(payload);
            }
            if buf.len() < offset + len {
                return None;
            }
            payload.extend_from_slice(&buf[offset..offset + len]);
            offset += len;
        }
    }

    /// GOODBYE gets no reply (the client doesn't wait for one); everything
    /// else gets a bare SUCCESS, which is enough to drive the connection's
    /// state machine through a full RUN/PULL or BEGIN/COMMIT cycle.
    fn dispatch(signature: u8) -> Option<Value> {
        if signature == 0x02 {
            return None;
        }
        Some(success(vec![("fields", Value::List(vec![Value::String("n".into())]))]))
    }
}

impl Read for FakeServer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending_out.is_empty() {
            self.fill_pending();
        }
        let n = buf.len().min(self.pending_out.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.pending_out.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for FakeServer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.from_client.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for FakeServer {
    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn set_write_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) {}
}
