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

//! The [`Value`] type: PackStream's sum type, carried both directions over
//! the wire (query parameters going out, records coming back).

pub mod graph;
pub mod spatial;
pub mod time;

use std::collections::HashMap;

pub use graph::{Node, Path, Relationship, UnboundRelationship};
pub use spatial::{Point2D, Point3D};
pub use time::{Date, DateTime, Duration, LocalDateTime, LocalTime, Time};

/// A value as carried by the Bolt wire protocol.
///
/// This single recursive enum is used both for values the client sends
/// (query parameters) and values the client receives (record fields), since
/// PackStream itself makes no such distinction: a tagged structure decoded
/// from a RECORD is indistinguishable in shape from one the client could have
/// encoded into a RUN's parameter map.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    Node(Node),
    Relationship(Relationship),
    Path(Path),
    Point2D(Point2D),
    Point3D(Point3D),
    Date(Date),
    Time(Time),
    LocalTime(LocalTime),
    DateTime(DateTime),
    LocalDateTime(LocalDateTime),
    Duration(Duration),
    /// A generic structure whose signature the codec did not recognize.
    /// Keeping it around (rather than failing to decode) lets the client
    /// degrade gracefully against servers newer than this driver.
    Structure { signature: u8, fields: Vec<Value> },
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn try_into_string(self) -> Result<String, Self> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other),
        }
    }

    pub fn try_into_map(self) -> Result<HashMap<String, Value>, Self> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(other),
        }
    }

    pub fn try_into_list(self) -> Result<Vec<Value>, Self> {
        match self {
            Value::List(l) => Ok(l),
            other => Err(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Build a `Value::Map` from key/value pairs, used to construct query
/// parameters and message metadata maps.
#[macro_export]
macro_rules! value_map {
    ({$($key:literal: $value:expr),* $(,)?}) => {{
        #[allow(unused_mut)]
        let mut map = ::std::collections::HashMap::new();
        $(map.insert(String::from($key), $crate::value::Value::from($value));)*
        $crate::value::Value::Map(map)
    }};
}
