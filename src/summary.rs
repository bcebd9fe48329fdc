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

//! [`Summary`]: the metadata a server attaches to RUN/PULL's terminal
//! SUCCESS (section 3's `Result` type).

use std::collections::HashMap;
use std::time::Duration;

use crate::value::Value;

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        _ => None,
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn as_map(value: &Value) -> Option<&HashMap<String, Value>> {
    match value {
        Value::Map(m) => Some(m),
        _ => None,
    }
}

fn as_list(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) => Some(items),
        _ => None,
    }
}

/// Counters for write operations performed by the query (from the
/// `stats` field of SUCCESS's metadata).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counters {
    pub nodes_created: i64,
    pub nodes_deleted: i64,
    pub relationships_created: i64,
    pub relationships_deleted: i64,
    pub properties_set: i64,
    pub labels_added: i64,
    pub labels_removed: i64,
    pub indexes_added: i64,
    pub indexes_removed: i64,
    pub constraints_added: i64,
    pub constraints_removed: i64,
    pub system_updates: i64,
    pub contains_updates: bool,
}

impl Counters {
    fn from_meta(meta: &HashMap<String, Value>) -> Self {
        let Some(stats) = meta.get("stats").and_then(as_map) else {
            return Self::default();
        };
        let int = |key: &str| stats.get(key).and_then(as_int).unwrap_or(0);
        let nodes_created = int("nodes-created");
        let nodes_deleted = int("nodes-deleted");
        let relationships_created = int("relationships-created");
        let relationships_deleted = int("relationships-deleted");
        let properties_set = int("properties-set");
        let labels_added = int("labels-added");
        let labels_removed = int("labels-removed");
        let indexes_added = int("indexes-added");
        let indexes_removed = int("indexes-removed");
        let constraints_added = int("constraints-added");
        let constraints_removed = int("constraints-removed");
        let system_updates = int("system-updates");
        let contains_updates = stats
            .get("contains-updates")
            .and_then(as_bool)
            .unwrap_or(
                nodes_created > 0
                    || nodes_deleted > 0
                    || relationships_created > 0
                    || relationships_deleted > 0
                    || properties_set > 0
                    || labels_added > 0
                    || labels_removed > 0
                    || indexes_added > 0
                    || indexes_removed > 0
                    || constraints_added > 0
                    || constraints_removed > 0,
            );
        Self {
            nodes_created,
            nodes_deleted,
            relationships_created,
            relationships_deleted,
            properties_set,
            labels_added,
            labels_removed,
            indexes_added,
            indexes_removed,
            constraints_added,
            constraints_removed,
            system_updates,
            contains_updates,
        }
    }
}

/// One node of a query plan or profile tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub operator_type: String,
    pub identifiers: Vec<String>,
    pub arguments: HashMap<String, Value>,
    pub children: Vec<Plan>,
}

impl Plan {
    fn from_value(value: &Value) -> Option<Self> {
        let map = as_map(value)?;
        let operator_type = map.get("operatorType").and_then(as_string).unwrap_or_default();
        let identifiers = map
            .get("identifiers")
            .and_then(as_list)
            .map(|items| items.iter().filter_map(as_string).collect())
            .unwrap_or_default();
        let arguments = map.get("args").and_then(as_map).cloned().unwrap_or_default();
        let children = map
            .get("children")
            .and_then(as_list)
            .map(|items| items.iter().filter_map(Plan::from_value).collect())
            .unwrap_or_default();
        Some(Self {
            operator_type,
            identifiers,
            arguments,
            children,
        })
    }
}

/// One node of a profiled query's execution tree: a [`Plan`] node plus the
/// runtime counters the server collected while executing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub plan: Plan,
    pub db_hits: i64,
    pub rows: i64,
    pub page_cache_hits: i64,
    pub page_cache_misses: i64,
    pub page_cache_hit_ratio: f64,
    pub time: i64,
    pub children: Vec<Profile>,
}

impl Profile {
    fn from_value(value: &Value) -> Option<Self> {
        let map = as_map(value)?;
        let plan = Plan::from_value(value).unwrap_or_default();
        let db_hits = map.get("dbHits").and_then(as_int).unwrap_or(0);
        let rows = map.get("rows").and_then(as_int).unwrap_or(0);
        let page_cache_hits = map.get("pageCacheHits").and_then(as_int).unwrap_or(0);
        let page_cache_misses = map.get("pageCacheMisses").and_then(as_int).unwrap_or(0);
        let page_cache_hit_ratio = match map.get("pageCacheHitRatio") {
            Some(Value::Float(f)) => *f,
            _ => 0.0,
        };
        let time = map.get("time").and_then(as_int).unwrap_or(0);
        let children = map
            .get("children")
            .and_then(as_list)
            .map(|items| items.iter().filter_map(Profile::from_value).collect())
            .unwrap_or_default();
        Some(Self {
            plan,
            db_hits,
            rows,
            page_cache_hits,
            page_cache_misses,
            page_cache_hit_ratio,
            time,
            children,
        })
    }
}

/// A notification raised by the server while planning or running the query
/// (deprecation warnings, missing index hints, etc).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notification {
    pub code: String,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub category: String,
}

impl Notification {
    fn from_value(value: &Value) -> Option<Self> {
        let map = as_map(value)?;
        Some(Self {
            code: map.get("code").and_then(as_string).unwrap_or_default(),
            title: map.get("title").and_then(as_string).unwrap_or_default(),
            description: map.get("description").and_then(as_string).unwrap_or_default(),
            severity: map.get("severity").and_then(as_string).unwrap_or_default(),
            category: map.get("category").and_then(as_string).unwrap_or_default(),
        })
    }
}

/// Identifies the server a connection is talking to.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    pub address: String,
    pub server_agent: String,
    pub protocol_version: (u8, u8),
}

/// The kind of query that produced a [`Summary`] (SUCCESS's `type` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Read,
    Write,
    ReadWrite,
    Schema,
}

impl QueryType {
    fn from_meta(meta: &HashMap<String, Value>) -> Option<Self> {
        match meta.get("type").and_then(as_string)?.as_str() {
            "r" => Some(QueryType::Read),
            "w" => Some(QueryType::Write),
            "rw" => Some(QueryType::ReadWrite),
            "s" => Some(QueryType::Schema),
            _ => None,
        }
    }
}

/// Metadata attached to a query's terminal SUCCESS (section 3's `Result`
/// type's `summary` field): timings, write counters, the query plan (if
/// `EXPLAIN`ed) or profile (if `PROFILE`d), notifications, and which
/// database answered.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub result_available_after: Option<Duration>,
    pub result_consumed_after: Option<Duration>,
    pub counters: Counters,
    pub plan: Option<Plan>,
    pub profile: Option<Profile>,
    pub notifications: Vec<Notification>,
    pub database: Option<String>,
    pub query_type: Option<QueryType>,
    pub server: Option<ServerInfo>,
}

impl Summary {
    /// Builds a `Summary` from RUN's SUCCESS metadata (`t_first`), PULL's
    /// terminal SUCCESS metadata (everything else), and the `server` this
    /// connection authenticated against. `run_meta` and `pull_meta` are
    /// merged, with `pull_meta` taking precedence on overlapping keys.
    pub(crate) fn from_meta(
        run_meta: &HashMap<String, Value>,
        pull_meta: &HashMap<String, Value>,
        server: Option<ServerInfo>,
    ) -> Self {
        let result_available_after = run_meta.get("t_first").and_then(as_int).map(|ms| {
            Duration::from_millis(ms.max(0) as u64)
        });
        let result_consumed_after = pull_meta.get("t_last").and_then(as_int).map(|ms| {
            Duration::from_millis(ms.max(0) as u64)
        });
        let counters = Counters::from_meta(pull_meta);
        let plan = pull_meta.get("plan").and_then(Plan::from_value);
        let profile = pull_meta.get("profile").and_then(Profile::from_value);
        let notifications = pull_meta
            .get("notifications")
            .and_then(as_list)
            .map(|items| items.iter().filter_map(Notification::from_value).collect())
            .unwrap_or_default();
        let database = pull_meta.get("db").and_then(as_string);
        let query_type = QueryType::from_meta(pull_meta).or_else(|| QueryType::from_meta(run_meta));
        Self {
            result_available_after,
            result_consumed_after,
            counters,
            plan,
            profile,
            notifications,
            database,
            query_type,
            server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> HashMap<String, Value> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn counters_default_when_no_stats() {
        let counters = Counters::from_meta(&HashMap::new());
        assert_eq!(counters, Counters::default());
    }

    #[test]
    fn counters_infer_contains_updates() {
        let meta = map(vec![(
            "stats",
            Value::Map(map(vec![("nodes-created", Value::Integer(3))])),
        )]);
        let counters = Counters::from_meta(&meta);
        assert_eq!(counters.nodes_created, 3);
        assert!(counters.contains_updates);
    }

    #[test]
    fn summary_merges_run_and_pull_timings() {
        let run_meta = map(vec![("t_first", Value::Integer(5))]);
        let pull_meta = map(vec![("t_last", Value::Integer(12)), ("db", Value::String("neo4j".into()))]);
        let summary = Summary::from_meta(&run_meta, &pull_meta, None);
        assert_eq!(summary.result_available_after, Some(Duration::from_millis(5)));
        assert_eq!(summary.result_consumed_after, Some(Duration::from_millis(12)));
        assert_eq!(summary.database, Some("neo4j".to_string()));
    }

    #[test]
    fn summary_parses_query_type_and_carries_server_info() {
        let pull_meta = map(vec![("type", Value::String("rw".into()))]);
        let server = ServerInfo {
            address: "localhost:7687".to_string(),
            server_agent: "Neo4j/5.4.0".to_string(),
            protocol_version: (5, 4),
        };
        let summary = Summary::from_meta(&HashMap::new(), &pull_meta, Some(server.clone()));
        assert_eq!(summary.query_type, Some(QueryType::ReadWrite));
        assert_eq!(summary.server, Some(server));
    }

    #[test]
    fn summary_leaves_query_type_none_on_unknown_code() {
        let pull_meta = map(vec![("type", Value::String("bogus".into()))]);
        let summary = Summary::from_meta(&HashMap::new(), &pull_meta, None);
        assert_eq!(summary.query_type, None);
    }

    #[test]
    fn plan_parses_nested_children() {
        let plan_value = Value::Map(map(vec![
            ("operatorType", Value::String("ProduceResults".into())),
            (
                "children",
                Value::List(vec![Value::Map(map(vec![(
                    "operatorType",
                    Value::String("AllNodesScan".into()),
                )]))]),
            ),
        ]));
        let plan = Plan::from_value(&plan_value).unwrap();
        assert_eq!(plan.operator_type, "ProduceResults");
        assert_eq!(plan.children.len(), 1);
        assert_eq!(plan.children[0].operator_type, "AllNodesScan");
    }
}
