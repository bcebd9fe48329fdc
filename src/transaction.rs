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

//! [`Transaction`]: an explicit, client-managed BEGIN...COMMIT/ROLLBACK unit
//! (section 4.6).

use std::collections::HashMap;

use log::warn;

use crate::bolt::{Connection, ConnectionState, Transport};
use crate::error::Result;
use crate::record::Record;
use crate::record_stream::RecordStream;
use crate::summary::Summary;
use crate::value::Value;

/// An explicit transaction opened with `BEGIN`.
///
/// Borrowing the connection mutably for as long as the transaction lives
/// means the borrow checker enforces the one-RUN/PULL-cycle-at-a-time
/// invariant for us: a caller can't start a second query while a
/// [`RecordStream`] from an earlier one is still borrowing the connection.
///
/// Dropping a `Transaction` that was neither committed nor rolled back
/// rolls it back, same as leaving a `with` block without an explicit
/// decision.
pub struct Transaction<'a, T: Transport> {
    connection: Option<&'a mut Connection<T>>,
    batch_size: i64,
    finished: bool,
}

impl<'a, T: Transport> Transaction<'a, T> {
    pub(crate) fn begin(
        connection: &'a mut Connection<T>,
        extra: HashMap<String, Value>,
        batch_size: i64,
    ) -> Result<Self> {
        connection.begin(extra)?;
        Ok(Self {
            connection: Some(connection),
            batch_size,
            finished: false,
        })
    }

    fn connection(&mut self) -> &mut Connection<T> {
        self.connection.as_mut().expect("connection taken only by Drop")
    }

    /// Runs a query inside this transaction, returning a lazy cursor over
    /// its results.
    pub fn run_streaming(
        &mut self,
        query: &str,
        params: HashMap<String, Value>,
    ) -> Result<RecordStream<'_, T>> {
        let batch_size = self.batch_size;
        let run_meta = self.connection().run(query, params, HashMap::new())?;
        Ok(RecordStream::new(self.connection(), run_meta, batch_size))
    }

    /// Runs a query and eagerly collects every record plus its summary.
    pub fn run(
        &mut self,
        query: &str,
        params: HashMap<String, Value>,
    ) -> Result<(Vec<Record>, Summary)> {
        self.run_streaming(query, params)?.collect_remaining()
    }

    /// Commits the transaction. Consumes `self` so it can't be used again.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.connection().commit()
    }

    /// Rolls the transaction back. Consumes `self` so it can't be used
    /// again.
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.connection().rollback()
    }
}

impl<T: Transport> Drop for Transaction<'_, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(connection) = self.connection.as_mut() {
            if let Err(err) = connection.rollback() {
                warn!("implicit rollback on drop failed: {err}");
            }
        }
    }
}

/// Runs `work` inside a fresh transaction, committing if it returns `Ok` and
/// rolling back if it returns `Err` (REDESIGN FLAGS: an explicit builder
/// taking the transaction handle, rather than a zero-arity retry callback).
pub fn with_transaction<T, R>(
    connection: &mut Connection<T>,
    batch_size: i64,
    work: impl FnOnce(&mut Transaction<'_, T>) -> Result<R>,
) -> Result<R>
where
    T: Transport,
{
    let mut tx = Transaction::begin(connection, HashMap::new(), batch_size)?;
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
