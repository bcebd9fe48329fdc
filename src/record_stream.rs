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

//! [`RecordStream`]: the lazy, batched-PULL cursor over a query's results
//! (section 4.7).
//!
//! Every protocol version this crate speaks (5.1-5.4) supports server-side
//! PULL continuation, so the SKIP/LIMIT client-side fallback some older Bolt
//! clients need never applies here; there is no fallback path to implement.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::bolt::{Connection, Transport};
use crate::error::Result;
use crate::record::Record;
use crate::summary::Summary;
use crate::value::Value;

fn fields_from_run_meta(meta: &HashMap<String, Value>) -> Vec<String> {
    match meta.get("fields") {
        Some(Value::List(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Iterates a query's result rows, fetching `batch_size` records at a time
/// via PULL continuation instead of buffering the whole result set.
pub struct RecordStream<'a, T: Transport> {
    connection: &'a mut Connection<T>,
    fields: Arc<Vec<String>>,
    batch_size: i64,
    buffer: VecDeque<Record>,
    has_more: bool,
    run_meta: HashMap<String, Value>,
    last_pull_meta: HashMap<String, Value>,
}

impl<'a, T: Transport> RecordStream<'a, T> {
    pub(crate) fn new(
        connection: &'a mut Connection<T>,
        run_meta: HashMap<String, Value>,
        batch_size: i64,
    ) -> Self {
        let fields = Arc::new(fields_from_run_meta(&run_meta));
        Self {
            connection,
            fields,
            batch_size,
            buffer: VecDeque::new(),
            has_more: true,
            run_meta,
            last_pull_meta: HashMap::new(),
        }
    }

    /// The field names named by the query's `RETURN` clause.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn fill(&mut self) -> Result<()> {
        if !self.buffer.is_empty() || !self.has_more {
            return Ok(());
        }
        let (records, more, meta) = self.connection.pull(self.batch_size)?;
        self.has_more = more;
        self.last_pull_meta = meta;
        for values in records {
            self.buffer.push_back(Record::new(Arc::clone(&self.fields), values));
        }
        Ok(())
    }

    /// Fetches and returns the next record, pulling another batch from the
    /// server if the current one is exhausted. Returns `None` once the
    /// result set is exhausted.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        self.fill()?;
        Ok(self.buffer.pop_front())
    }

    /// Discards every remaining record (without pulling them across the
    /// wire) and returns the query's summary.
    pub fn consume(mut self) -> Result<Summary> {
        self.buffer.clear();
        while self.has_more {
            let (_, more, meta) = self.connection.discard(-1)?;
            self.has_more = more;
            self.last_pull_meta = meta;
        }
        let server = self.connection.server_info();
        Ok(Summary::from_meta(&self.run_meta, &self.last_pull_meta, Some(server)))
    }

    /// Collects every remaining record plus the summary, i.e. eagerly
    /// drains the stream instead of iterating it lazily.
    pub fn collect_remaining(mut self) -> Result<(Vec<Record>, Summary)> {
        let mut records = Vec::new();
        loop {
            match self.next_record()? {
                Some(record) => records.push(record),
                None => break,
            }
        }
        let server = self.connection.server_info();
        let summary = Summary::from_meta(&self.run_meta, &self.last_pull_meta, Some(server));
        Ok((records, summary))
    }
}
