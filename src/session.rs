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

//! [`Session`]: the sequential execution surface on a connection borrowed
//! from a [`Pool`] (section 4.5).
//!
//! A session owns its connection for as long as it lives, same as
//! [`Transaction`] borrows a session's connection for as long as it lives;
//! the one-RUN/PULL-cycle-at-a-time invariant falls out of the borrow
//! checker rather than a runtime check.

use std::collections::HashMap;
use std::time::Duration;

use crate::bolt::Transport;
use crate::error::Result;
use crate::pool::{Pool, PooledConnection};
use crate::record::Record;
use crate::record_stream::RecordStream;
use crate::summary::Summary;
use crate::transaction::Transaction;
use crate::value::Value;

/// Which end of a (potential) cluster a query should be routed to. Bolt
/// carries this as the RUN/BEGIN `mode` extra field; this crate speaks to a
/// single server directly (cluster routing is out of scope, see
/// `DESIGN.md`), so the field is forwarded as-is without influencing which
/// connection is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

impl AccessMode {
    fn as_str(self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
        }
    }
}

/// Options recognized by [`Session::run`]/[`Session::run_streaming`] and
/// [`Session::begin_transaction`] (section 4.5/6's configuration table):
/// `timeout` caps the transport read for this call, `mode` and `tx_timeout`
/// are forwarded to the server as RUN/BEGIN extra fields.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub timeout: Option<Duration>,
    pub mode: Option<AccessMode>,
    pub tx_timeout: Option<Duration>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = Some(timeout);
        self
    }

    fn extra(&self) -> HashMap<String, Value> {
        let mut extra = HashMap::new();
        if let Some(mode) = self.mode {
            extra.insert("mode".to_string(), Value::String(mode.as_str().to_string()));
        }
        if let Some(tx_timeout) = self.tx_timeout {
            extra.insert(
                "tx_timeout".to_string(),
                Value::Integer(tx_timeout.as_millis() as i64),
            );
        }
        extra
    }
}

/// A connection on loan from a [`Pool`] for a sequence of auto-commit
/// queries and/or explicit transactions.
pub struct Session<'p, T: Transport> {
    connection: PooledConnection<'p, T>,
    batch_size: i64,
    default_query_timeout: Duration,
}

impl<'p, T: Transport + Send + 'static> Session<'p, T> {
    pub(crate) fn new(pool: &'p Pool<T>) -> Result<Self> {
        let connection = pool.checkout()?;
        let config = pool.driver_config();
        Ok(Self {
            connection,
            batch_size: config.batch_size,
            default_query_timeout: config.query_timeout,
        })
    }

    fn apply_timeout(&mut self, opts: &RunOptions) {
        self.connection
            .set_query_timeout(opts.timeout.unwrap_or(self.default_query_timeout));
    }

    /// Auto-commit query: RUN followed by PULL(-1), eagerly collecting
    /// every record plus the terminal SUCCESS's summary.
    pub fn run(
        &mut self,
        query: &str,
        params: HashMap<String, Value>,
        opts: RunOptions,
    ) -> Result<(Vec<Record>, Summary)> {
        self.run_streaming(query, params, opts)?.collect_remaining()
    }

    /// Auto-commit query returning a lazy, batched cursor instead of
    /// eagerly collecting the whole result set (section 4.7).
    pub fn run_streaming(
        &mut self,
        query: &str,
        params: HashMap<String, Value>,
        opts: RunOptions,
    ) -> Result<RecordStream<'_, T>> {
        self.connection.recover_if_failed()?;
        self.apply_timeout(&opts);
        let extra = opts.extra();
        let run_meta = self.connection.run(query, params, extra)?;
        Ok(RecordStream::new(&mut self.connection, run_meta, self.batch_size))
    }

    /// Opens an explicit transaction (BEGIN), borrowing this session's
    /// connection for the transaction's lifetime.
    pub fn begin_transaction(&mut self, opts: RunOptions) -> Result<Transaction<'_, T>> {
        self.connection.recover_if_failed()?;
        self.apply_timeout(&opts);
        let extra = opts.extra();
        Transaction::begin(&mut self.connection, extra, self.batch_size)
    }

    /// Runs `work` inside a fresh transaction, committing on `Ok` and
    /// rolling back on `Err` (section 4.6, REDESIGN FLAGS: the transaction
    /// handle is passed to `work` explicitly rather than relying on an
    /// ambient "current connection").
    pub fn with_transaction<R>(
        &mut self,
        opts: RunOptions,
        work: impl FnOnce(&mut Transaction<'_, T>) -> Result<R>,
    ) -> Result<R> {
        let mut tx = self.begin_transaction(opts)?;
        match work(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback();
                Err(err)
            }
        }
    }

    /// Sends GOODBYE and marks the connection defunct; the pool discards it
    /// instead of checking it back in once this session drops (section
    /// 4.5's `close()`).
    pub fn close(mut self) {
        self.connection.goodbye();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::message;
    use crate::config::auth::AuthToken;
    use crate::config::{DriverConfig, PoolConfig};
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};

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

    fn chunk_message(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out.extend_from_slice(&[0, 0]);
        out
    }

    fn encode_chunked(value: &Value) -> Vec<u8> {
        chunk_message(&crate::packstream::encode(value).unwrap())
    }

    fn success(fields: Vec<(&str, Value)>) -> Value {
        Value::Structure {
            signature: message::SUCCESS,
            fields: vec![Value::Map(
                fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            )],
        }
    }

    fn record(values: Vec<Value>) -> Value {
        Value::Structure {
            signature: message::RECORD,
            fields: vec![Value::List(values)],
        }
    }

    fn scripted_pool(mut server_bytes: Vec<u8>) -> Pool<MockTransport> {
        let mut bytes = vec![0, 0, 4, 5]; // handshake reply: version 5.4
        bytes.append(&mut server_bytes);
        let to_client: VecDeque<u8> = bytes.into();
        Pool::with_connector(
            move || {
                Ok(MockTransport {
                    to_client: to_client.clone(),
                    from_client: Vec::new(),
                })
            },
            DriverConfig::new(AuthToken::new_none_auth()),
            PoolConfig::new()
                .with_pool_size(1)
                .with_checkout_timeout(Duration::from_millis(200)),
        )
    }

    #[test]
    fn run_collects_records_and_returns_connection_to_pool() {
        let mut reply = encode_chunked(&success(vec![])); // hello
        reply.extend(encode_chunked(&success(vec![]))); // logon
        reply.extend(encode_chunked(&success(vec![(
            "fields",
            Value::List(vec![Value::String("n".into())]),
        )]))); // run
        reply.extend(encode_chunked(&record(vec![Value::Integer(1)])));
        reply.extend(encode_chunked(&success(vec![("db", Value::String("neo4j".into()))])));

        let pool = scripted_pool(reply);
        let mut session = pool.session().unwrap();
        let (records, summary) = session.run("RETURN 1 AS n", HashMap::new(), RunOptions::new()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(0), Some(&Value::Integer(1)));
        assert_eq!(summary.database, Some("neo4j".to_string()));
        drop(session);
        assert_eq!(pool.live_count(), 1);
    }

    #[test]
    fn with_transaction_commits_on_success() {
        let mut reply = encode_chunked(&success(vec![])); // hello
        reply.extend(encode_chunked(&success(vec![]))); // logon
        reply.extend(encode_chunked(&success(vec![]))); // begin
        reply.extend(encode_chunked(&success(vec![(
            "fields",
            Value::List(vec![Value::String("n".into())]),
        )]))); // run
        reply.extend(encode_chunked(&success(vec![]))); // pull(-1), no records
        reply.extend(encode_chunked(&success(vec![]))); // commit

        let pool = scripted_pool(reply);
        let mut session = pool.session().unwrap();
        let result = session.with_transaction(RunOptions::new(), |tx| {
            tx.run("RETURN 1 AS n", HashMap::new())?;
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn run_options_carry_mode_and_tx_timeout_into_extra() {
        let opts = RunOptions::new()
            .with_mode(AccessMode::Read)
            .with_tx_timeout(Duration::from_millis(500));
        let extra = opts.extra();
        assert_eq!(extra.get("mode"), Some(&Value::String("r".into())));
        assert_eq!(extra.get("tx_timeout"), Some(&Value::Integer(500)));
    }
}
