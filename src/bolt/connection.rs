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

//! [`Connection`]: one negotiated, authenticated Bolt link, wiring together
//! the handshake, chunked framing, PackStream codec and state machine into
//! the request/response operations a [`crate::session::Session`] drives.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::time::Duration;

use log::{debug, trace};

use super::chunk::{chunk_message, Accumulator};
use super::handshake::{self, BOLT_MAGIC};
use super::message::{self, Response};
use super::socket::Transport;
use super::state::{ConnectionState, Event};
use crate::error::{BoltError, Result, ServerError};
use crate::packstream;
use crate::summary::ServerInfo;
use crate::value::Value;

const READ_CHUNK_SIZE: usize = 8192;

/// One Bolt connection: transport, negotiated version, protocol state and
/// receive buffer (section 2's `Connection`).
///
/// Single-threaded by construction: every operation takes `&mut self`, so
/// the pool (section 5) is the only place that needs to reason about
/// concurrent access to connections.
pub struct Connection<T: Transport> {
    transport: T,
    version: (u8, u8),
    state: ConnectionState,
    recv: Accumulator,
    query_timeout: Duration,
    address: String,
    server_agent: Option<String>,
}

impl<T: Transport> Connection<T> {
    /// Performs the handshake over an already-connected transport and
    /// leaves the connection in `Authenticating`, ready for [`Connection::hello`].
    pub fn handshake(mut transport: T, connect_timeout: Duration, query_timeout: Duration) -> Result<Self> {
        transport
            .set_write_timeout(Some(connect_timeout))
            .map_err(BoltError::connect)?;
        transport
            .set_read_timeout(Some(connect_timeout))
            .map_err(BoltError::connect)?;

        trace!("C: <HANDSHAKE> {BOLT_MAGIC:02X?}");
        transport.write_all(&BOLT_MAGIC).map_err(BoltError::write)?;
        let offer = handshake::version_proposal();
        trace!("C: <BOLT> {offer:02X?}");
        transport.write_all(&offer).map_err(BoltError::write)?;
        transport.flush().map_err(BoltError::write)?;

        let mut reply = [0u8; 4];
        transport.read_exact(&mut reply).map_err(BoltError::read)?;
        trace!("S: <BOLT> {reply:02X?}");
        let version = handshake::decode_agreed_version(&reply)?;
        debug!("negotiated Bolt {}.{}", version.0, version.1);

        let state = ConnectionState::Disconnected
            .advance(Event::Connected)?
            .advance(Event::HandshakeOk)?;

        Ok(Self {
            transport,
            version,
            state,
            recv: Accumulator::new(),
            query_timeout,
            address: String::new(),
            server_agent: None,
        })
    }

    pub fn protocol_version(&self) -> (u8, u8) {
        self.version
    }

    /// Records the address a caller connected this transport to, for
    /// [`Connection::server_info`]. A connection opened through a
    /// non-address connector (tests, an in-memory transport) simply never
    /// calls this and reports an empty address.
    pub(crate) fn set_address(&mut self, address: String) {
        self.address = address;
    }

    /// The server identity to attach to a [`crate::summary::Summary`]
    /// (section 6): the negotiated protocol version plus whatever HELLO's
    /// SUCCESS reported as `server`, once authentication has completed.
    pub(crate) fn server_info(&self) -> ServerInfo {
        ServerInfo {
            address: self.address.clone(),
            server_agent: self.server_agent.clone().unwrap_or_default(),
            protocol_version: self.version,
        }
    }

    /// Overrides the transport read timeout used by every subsequent
    /// `recv`, e.g. for a session's per-call `timeout` option (section 4.5).
    pub fn set_query_timeout(&mut self, timeout: Duration) {
        self.query_timeout = timeout;
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, message: &Value) -> Result<()> {
        let payload = packstream::encode(message).map_err(|e| BoltError::protocol(e.to_string()))?;
        trace!("C: {message:?}");
        self.transport
            .write_all(&chunk_message(&payload))
            .map_err(BoltError::write)
    }

    /// Reads the receive buffer first (section 4.4's buffered-read
    /// requirement) and only blocks on the transport when no complete
    /// message is already buffered.
    fn recv_raw(&mut self) -> Result<Value> {
        loop {
            if let Some(message) = self.recv.next_message() {
                let (value, consumed) =
                    packstream::decode(&message).map_err(|e| BoltError::protocol(e.to_string()))?;
                if consumed != message.len() {
                    return Err(BoltError::protocol(
                        "trailing bytes after decoding one Bolt message",
                    ));
                }
                trace!("S: {value:?}");
                return Ok(value);
            }
            let mut buf = [0u8; READ_CHUNK_SIZE];
            self.transport
                .set_read_timeout(Some(self.query_timeout))
                .map_err(BoltError::read)?;
            let n = self.transport.read(&mut buf).map_err(BoltError::read)?;
            if n == 0 {
                return Err(BoltError::disconnected(
                    "connection closed while waiting for a reply",
                ));
            }
            self.recv.feed(&buf[..n]);
        }
    }

    fn recv_response(&mut self) -> Result<Response> {
        message::classify(self.recv_raw()?)
    }

    /// HELLO followed by LOGON, per section 4.4's 5.1+ authentication split.
    pub fn hello(
        &mut self,
        user_agent: &str,
        bolt_agent: &str,
        auth: &HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>> {
        self.send(&message::hello(user_agent, bolt_agent, None))?;
        match self.recv_response()? {
            Response::Success(meta) => {
                self.server_agent = match meta.get("server") {
                    Some(Value::String(s)) => Some(s.clone()),
                    _ => None,
                };
                self.state = self.state.advance(Event::HelloOrLogonSuccess)?;
            }
            Response::Failure(meta) => {
                self.state = self.state.advance(Event::HelloOrLogonFailure)?;
                return Err(BoltError::AuthFailed {
                    error: ServerError::from_meta(meta),
                });
            }
            other => return Err(unexpected("SUCCESS or FAILURE after HELLO", other)),
        }

        self.send(&message::logon(auth))?;
        match self.recv_response()? {
            Response::Success(meta) => Ok(meta),
            Response::Failure(meta) => {
                self.state = ConnectionState::Defunct;
                Err(BoltError::AuthFailed {
                    error: ServerError::from_meta(meta),
                })
            }
            other => Err(unexpected("SUCCESS or FAILURE after LOGON", other)),
        }
    }

    /// Writes RUN and returns the SUCCESS metadata (carrying `fields`), or
    /// the typed query error. Does not PULL; the caller (session or
    /// transaction) drives that separately so autocommit and explicit
    /// transactions can share this method.
    pub fn run(
        &mut self,
        query: &str,
        params: HashMap<String, Value>,
        extra: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>> {
        if !self.state.can_run() {
            return Err(BoltError::protocol(format!(
                "RUN is not legal in state {:?}",
                self.state
            )));
        }
        self.send(&message::run(query, params, extra))?;
        match self.recv_response()? {
            Response::Success(meta) => {
                self.state = self.state.advance(Event::Run)?;
                Ok(meta)
            }
            Response::Failure(meta) => {
                self.state = self.state.advance(Event::Failure)?;
                Err(BoltError::QueryFailed {
                    error: ServerError::from_meta(meta),
                })
            }
            other => Err(unexpected("SUCCESS or FAILURE after RUN", other)),
        }
    }

    /// One PULL round: writes `PULL {n}` and returns every RECORD, whether
    /// more remain, and the terminal SUCCESS's metadata (carrying the
    /// summary fields described in section 3's `Result` type once `more` is
    /// `false`). On FAILURE, returns the typed error and leaves state
    /// FAILED.
    pub fn pull(&mut self, n: i64) -> Result<(Vec<Vec<Value>>, bool, HashMap<String, Value>)> {
        if !self.state.can_pull() {
            return Err(BoltError::protocol(format!(
                "PULL is not legal in state {:?}",
                self.state
            )));
        }
        self.send(&message::pull(n, None))?;
        self.consume_pull_or_discard_reply()
    }

    pub fn discard(&mut self, n: i64) -> Result<(Vec<Vec<Value>>, bool, HashMap<String, Value>)> {
        if !self.state.can_pull() {
            return Err(BoltError::protocol(format!(
                "DISCARD is not legal in state {:?}",
                self.state
            )));
        }
        self.send(&message::discard(n, None))?;
        self.consume_pull_or_discard_reply()
    }

    fn consume_pull_or_discard_reply(
        &mut self,
    ) -> Result<(Vec<Vec<Value>>, bool, HashMap<String, Value>)> {
        let mut records = Vec::new();
        loop {
            match self.recv_response()? {
                Response::Record(values) => {
                    self.state = self.state.advance(Event::RecordReceived)?;
                    records.push(values);
                }
                Response::Success(meta) => {
                    let more = message::has_more(&meta);
                    self.state = self.state.advance(if more {
                        Event::PullOrDiscardHasMore
                    } else {
                        Event::PullOrDiscardDone
                    })?;
                    return Ok((records, more, meta));
                }
                Response::Failure(meta) => {
                    self.state = self.state.advance(Event::Failure)?;
                    return Err(BoltError::QueryFailed {
                        error: ServerError::from_meta(meta),
                    });
                }
                other => return Err(unexpected("RECORD, SUCCESS or FAILURE", other)),
            }
        }
    }

    pub fn begin(&mut self, extra: HashMap<String, Value>) -> Result<()> {
        if self.state != ConnectionState::Ready {
            return Err(BoltError::protocol(format!(
                "BEGIN is not legal in state {:?}",
                self.state
            )));
        }
        self.send(&message::begin(extra))?;
        match self.recv_response()? {
            Response::Success(_) => {
                self.state = self.state.advance(Event::Begin)?;
                Ok(())
            }
            Response::Failure(meta) => {
                self.state = self.state.advance(Event::Failure)?;
                Err(BoltError::QueryFailed {
                    error: ServerError::from_meta(meta),
                })
            }
            other => Err(unexpected("SUCCESS or FAILURE after BEGIN", other)),
        }
    }

    pub fn commit(&mut self) -> Result<()> {
        if self.state != ConnectionState::TxReady {
            return Err(BoltError::protocol(format!(
                "COMMIT is not legal in state {:?}",
                self.state
            )));
        }
        self.send(&message::commit())?;
        match self.recv_response()? {
            Response::Success(_) => {
                self.state = self.state.advance(Event::Commit)?;
                Ok(())
            }
            Response::Failure(meta) => {
                self.state = self.state.advance(Event::Failure)?;
                Err(BoltError::QueryFailed {
                    error: ServerError::from_meta(meta),
                })
            }
            other => Err(unexpected("SUCCESS or FAILURE after COMMIT", other)),
        }
    }

    /// Rolls the open transaction back. A query failure earlier in the
    /// transaction already aborted it server-side and left the connection
    /// FAILED (section 4.4: only RESET is legal from FAILED); rollback in
    /// that case is a RESET, which is the only way to rejoin READY.
    pub fn rollback(&mut self) -> Result<()> {
        if self.state == ConnectionState::Failed {
            return self.reset();
        }
        if self.state != ConnectionState::TxReady {
            return Err(BoltError::protocol(format!(
                "ROLLBACK is not legal in state {:?}",
                self.state
            )));
        }
        self.send(&message::rollback())?;
        match self.recv_response()? {
            Response::Success(_) => {
                self.state = self.state.advance(Event::Rollback)?;
                Ok(())
            }
            Response::Failure(meta) => {
                self.state = self.state.advance(Event::Failure)?;
                Err(BoltError::QueryFailed {
                    error: ServerError::from_meta(meta),
                })
            }
            other => Err(unexpected("SUCCESS or FAILURE after ROLLBACK", other)),
        }
    }

    /// RESET: the only way back to READY from FAILED (section 4.4).
    pub fn reset(&mut self) -> Result<()> {
        self.send(&message::reset())?;
        match self.recv_response()? {
            Response::Success(_) | Response::Ignored => {
                self.recv = Accumulator::new();
                self.state = self.state.advance(Event::Reset)?;
                Ok(())
            }
            other => Err(unexpected("SUCCESS after RESET", other)),
        }
    }

    /// GOODBYE: no reply expected, legal from any state (section 4.4).
    pub fn goodbye(&mut self) {
        let _ = self.send(&message::goodbye());
        self.state = ConnectionState::Defunct;
        self.transport.shutdown();
    }

    pub fn is_usable(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// RESETs a connection left FAILED by a prior query, a no-op otherwise
    /// (section 4.5: "the session issues RESET before the next call").
    pub(crate) fn recover_if_failed(&mut self) -> Result<()> {
        if self.state == ConnectionState::Failed {
            self.reset()?;
        }
        Ok(())
    }
}

fn unexpected(expected: &str, got: Response) -> BoltError {
    BoltError::protocol(format!("expected {expected}, got {got:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// An in-memory duplex transport for end-to-end tests: `to_client`
    /// holds bytes a scripted server has queued up, `from_client` records
    /// whatever the connection wrote.
    struct MockTransport {
        to_client: VecDeque<u8>,
        from_client: Vec<u8>,
    }

    impl Read for MockTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
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

    fn scripted(server_bytes: Vec<u8>) -> MockTransport {
        MockTransport {
            to_client: server_bytes.into(),
            from_client: Vec::new(),
        }
    }

    fn encode_chunked(value: &Value) -> Vec<u8> {
        chunk_message(&packstream::encode(value).unwrap())
    }

    fn connect_and_handshake(mut server_reply: Vec<u8>) -> Connection<MockTransport> {
        let mut bytes = vec![0, 0, 4, 5];
        bytes.append(&mut server_reply);
        let transport = scripted(bytes);
        Connection::handshake(transport, Duration::from_secs(1), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn handshake_negotiates_highest_offered_version() {
        let conn = connect_and_handshake(vec![]);
        assert_eq!(conn.protocol_version(), (5, 4));
        assert_eq!(conn.state(), ConnectionState::Authenticating);
    }

    #[test]
    fn hello_then_logon_reaches_ready() {
        let hello_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        let logon_success = hello_success.clone();
        let mut reply = hello_success;
        reply.extend(logon_success);
        let mut conn = connect_and_handshake(reply);

        let auth = HashMap::from([("scheme".to_string(), Value::String("none".into()))]);
        conn.hello("bolt-driver/0.1", "bolt-driver-rs/0.1", &auth).unwrap();
        assert_eq!(conn.state(), ConnectionState::Ready);
    }

    #[test]
    fn run_and_pull_yield_records_then_return_to_ready() {
        let hello_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        let mut reply = hello_success.clone();
        reply.extend(hello_success);

        let run_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::from([(
                "fields".to_string(),
                Value::List(vec![Value::String("n".into())]),
            )]))],
        });
        reply.extend(run_success);

        let record = encode_chunked(&Value::Structure {
            signature: message::RECORD,
            fields: vec![Value::List(vec![Value::Integer(1)])],
        });
        reply.extend(record);

        let pull_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        reply.extend(pull_success);

        let mut conn = connect_and_handshake(reply);
        conn.hello("bolt-driver/0.1", "bolt-driver-rs/0.1", &HashMap::new())
            .unwrap();

        let run_meta = conn.run("RETURN 1 AS n", HashMap::new(), HashMap::new()).unwrap();
        assert_eq!(
            run_meta.get("fields"),
            Some(&Value::List(vec![Value::String("n".into())]))
        );

        let (records, more, _) = conn.pull(-1).unwrap();
        assert!(!more);
        assert_eq!(records, vec![vec![Value::Integer(1)]]);
        assert_eq!(conn.state(), ConnectionState::Ready);
    }

    #[test]
    fn pull_without_prior_run_is_rejected_without_writing_to_the_wire() {
        let hello_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        let mut reply = hello_success.clone();
        reply.extend(hello_success);
        let mut conn = connect_and_handshake(reply);
        conn.hello("bolt-driver/0.1", "bolt-driver-rs/0.1", &HashMap::new())
            .unwrap();

        let written_before = conn.transport.from_client.len();
        let err = conn.pull(-1).unwrap_err();
        assert!(matches!(err, BoltError::ProtocolError { .. }));
        assert_eq!(conn.transport.from_client.len(), written_before);
        assert_eq!(conn.state(), ConnectionState::Ready);
    }

    #[test]
    fn failure_then_reset_returns_to_ready() {
        let hello_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        let mut reply = hello_success.clone();
        reply.extend(hello_success);

        let run_failure = encode_chunked(&Value::Structure {
            signature: message::FAILURE,
            fields: vec![Value::Map(HashMap::from([
                ("code".to_string(), Value::String("Neo.ClientError.Statement.SyntaxError".into())),
                ("message".to_string(), Value::String("bad query".into())),
            ]))],
        });
        reply.extend(run_failure);

        let reset_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        reply.extend(reset_success);

        let mut conn = connect_and_handshake(reply);
        conn.hello("bolt-driver/0.1", "bolt-driver-rs/0.1", &HashMap::new())
            .unwrap();

        let err = conn
            .run("not cypher", HashMap::new(), HashMap::new())
            .unwrap_err();
        assert!(matches!(err, BoltError::QueryFailed { .. }));
        assert_eq!(conn.state(), ConnectionState::Failed);

        conn.reset().unwrap();
        assert_eq!(conn.state(), ConnectionState::Ready);
    }

    #[test]
    fn coalesced_record_and_success_decode_without_extra_reads() {
        let hello_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        let mut reply = hello_success.clone();
        reply.extend(hello_success);

        let run_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        reply.extend(run_success);

        // RECORD and terminal SUCCESS arrive in the same read.
        let record = encode_chunked(&Value::Structure {
            signature: message::RECORD,
            fields: vec![Value::List(vec![Value::Integer(1)])],
        });
        let pull_success = encode_chunked(&Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(HashMap::new())],
        });
        let mut coalesced = record;
        coalesced.extend(pull_success);
        reply.extend(coalesced);

        let mut conn = connect_and_handshake(reply);
        conn.hello("bolt-driver/0.1", "bolt-driver-rs/0.1", &HashMap::new())
            .unwrap();
        conn.run("RETURN 1", HashMap::new(), HashMap::new()).unwrap();
        let (records, more, _) = conn.pull(-1).unwrap();
        assert!(!more);
        assert_eq!(records.len(), 1);
    }
}
