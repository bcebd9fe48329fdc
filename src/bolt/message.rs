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

//! Bolt messages: thin constructors producing [`Value::Structure`]s with the
//! signatures from section 3, plus a response classifier.

use std::collections::HashMap;

use crate::error::{BoltError, Result};
use crate::value::Value;

pub(crate) const HELLO: u8 = 0x01;
pub(crate) const LOGON: u8 = 0x6A;
pub(crate) const LOGOFF: u8 = 0x6B;
pub(crate) const GOODBYE: u8 = 0x02;
pub(crate) const RESET: u8 = 0x0F;
pub(crate) const RUN: u8 = 0x10;
pub(crate) const DISCARD: u8 = 0x2F;
pub(crate) const PULL: u8 = 0x3F;
pub(crate) const BEGIN: u8 = 0x11;
pub(crate) const COMMIT: u8 = 0x12;
pub(crate) const ROLLBACK: u8 = 0x13;
pub(crate) const ROUTE: u8 = 0x66;

pub(crate) const SUCCESS: u8 = 0x70;
pub(crate) const FAILURE: u8 = 0x7F;
pub(crate) const IGNORED: u8 = 0x7E;
pub(crate) const RECORD: u8 = 0x71;

fn map(fields: Vec<(&str, Value)>) -> Value {
    Value::Map(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

fn structure(signature: u8, fields: Vec<Value>) -> Value {
    Value::Structure { signature, fields }
}

/// HELLO, carrying `user_agent` and, for protocol versions older than 5.1,
/// the auth map merged in directly (section 4.4's "Authentication").
pub(crate) fn hello(user_agent: &str, bolt_agent: &str, auth: Option<&HashMap<String, Value>>) -> Value {
    let mut fields = vec![
        ("user_agent", Value::String(user_agent.to_string())),
        (
            "bolt_agent",
            map(vec![("product", Value::String(bolt_agent.to_string()))]),
        ),
    ];
    if let Some(auth) = auth {
        for (k, v) in auth {
            fields.push((k.as_str(), v.clone()));
        }
    }
    structure(HELLO, vec![map(fields)])
}

/// LOGON, carrying the auth map on its own (protocol 5.1+).
pub(crate) fn logon(auth: &HashMap<String, Value>) -> Value {
    structure(LOGON, vec![Value::Map(auth.clone())])
}

pub(crate) fn logoff() -> Value {
    structure(LOGOFF, vec![])
}

pub(crate) fn goodbye() -> Value {
    structure(GOODBYE, vec![])
}

pub(crate) fn reset() -> Value {
    structure(RESET, vec![])
}

pub(crate) fn run(query: &str, params: HashMap<String, Value>, extra: HashMap<String, Value>) -> Value {
    structure(
        RUN,
        vec![Value::String(query.to_string()), Value::Map(params), Value::Map(extra)],
    )
}

/// `n = -1` requests every remaining record.
pub(crate) fn pull(n: i64, qid: Option<i64>) -> Value {
    let mut fields = vec![("n", Value::Integer(n))];
    if let Some(qid) = qid {
        fields.push(("qid", Value::Integer(qid)));
    }
    structure(PULL, vec![map(fields)])
}

pub(crate) fn discard(n: i64, qid: Option<i64>) -> Value {
    let mut fields = vec![("n", Value::Integer(n))];
    if let Some(qid) = qid {
        fields.push(("qid", Value::Integer(qid)));
    }
    structure(DISCARD, vec![map(fields)])
}

pub(crate) fn begin(extra: HashMap<String, Value>) -> Value {
    structure(BEGIN, vec![Value::Map(extra)])
}

pub(crate) fn commit() -> Value {
    structure(COMMIT, vec![])
}

pub(crate) fn rollback() -> Value {
    structure(ROLLBACK, vec![])
}

/// A decoded reply, classified by its Structure signature (section 4.2).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Response {
    Success(HashMap<String, Value>),
    Failure(HashMap<String, Value>),
    Ignored,
    Record(Vec<Value>),
    /// A Structure whose signature this crate doesn't recognize as a
    /// message; surfacing it rather than erroring lets a caller at least see
    /// what arrived.
    Unknown { signature: u8, fields: Vec<Value> },
}

fn as_map(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Map(m) => m,
        _ => HashMap::new(),
    }
}

pub(crate) fn classify(value: Value) -> Result<Response> {
    match value {
        Value::Structure { signature, fields } => match signature {
            SUCCESS => Ok(Response::Success(as_map(
                fields.into_iter().next().unwrap_or(Value::Map(HashMap::new())),
            ))),
            FAILURE => Ok(Response::Failure(as_map(
                fields.into_iter().next().unwrap_or(Value::Map(HashMap::new())),
            ))),
            IGNORED => Ok(Response::Ignored),
            RECORD => {
                let values = match fields.into_iter().next() {
                    Some(Value::List(values)) => values,
                    _ => Vec::new(),
                };
                Ok(Response::Record(values))
            }
            other => Ok(Response::Unknown {
                signature: other,
                fields,
            }),
        },
        other => Err(BoltError::protocol(format!(
            "expected a Bolt message Structure, got {other:?}"
        ))),
    }
}

/// Whether a SUCCESS's metadata says more records are pending for this
/// query (section 4.4's `has_more`).
pub(crate) fn has_more(meta: &HashMap<String, Value>) -> bool {
    matches!(meta.get("has_more"), Some(Value::Boolean(true)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_success() {
        let value = structure(SUCCESS, vec![map(vec![("fields", Value::List(vec![]))])]);
        let Response::Success(meta) = classify(value).unwrap() else {
            panic!("expected Success")
        };
        assert!(meta.contains_key("fields"));
    }

    #[test]
    fn classify_record_unwraps_list() {
        let value = structure(RECORD, vec![Value::List(vec![Value::Integer(1)])]);
        let Response::Record(values) = classify(value).unwrap() else {
            panic!("expected Record")
        };
        assert_eq!(values, vec![Value::Integer(1)]);
    }

    #[test]
    fn classify_ignored() {
        let value = structure(IGNORED, vec![]);
        assert_eq!(classify(value).unwrap(), Response::Ignored);
    }

    #[test]
    fn classify_unknown_signature() {
        let value = structure(0xAB, vec![Value::Integer(1)]);
        let Response::Unknown { signature, fields } = classify(value).unwrap() else {
            panic!("expected Unknown")
        };
        assert_eq!(signature, 0xAB);
        assert_eq!(fields, vec![Value::Integer(1)]);
    }

    #[test]
    fn classify_rejects_non_structure() {
        assert!(classify(Value::Integer(1)).is_err());
    }

    #[test]
    fn has_more_defaults_to_false() {
        assert!(!has_more(&HashMap::new()));
    }

    #[test]
    fn hello_merges_auth_fields() {
        let mut auth = HashMap::new();
        auth.insert("scheme".to_string(), Value::String("basic".into()));
        let Value::Structure { signature, fields } = hello("bolt-driver/0.1", "bolt-driver-rs/0.1", Some(&auth))
        else {
            panic!("expected structure")
        };
        assert_eq!(signature, HELLO);
        let Value::Map(meta) = &fields[0] else {
            panic!("expected map")
        };
        assert_eq!(meta.get("scheme"), Some(&Value::String("basic".into())));
        assert_eq!(
            meta.get("user_agent"),
            Some(&Value::String("bolt-driver/0.1".into()))
        );
    }

    #[test]
    fn pull_all_uses_n_negative_one() {
        let Value::Structure { fields, .. } = pull(-1, None) else {
            panic!("expected structure")
        };
        let Value::Map(meta) = &fields[0] else {
            panic!("expected map")
        };
        assert_eq!(meta.get("n"), Some(&Value::Integer(-1)));
    }
}
