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

//! Signature constants for PackStream's tagged structures, and the
//! dispatch table that turns a decoded `(signature, fields)` pair into a
//! typed [`Value`] variant for the graph/spatial/temporal types (section
//! 4.1's structure decoding table). Bolt *messages* are Structures too, but
//! are handled by `crate::bolt::message`, not here: this module only knows
//! about database value types.

use std::collections::HashMap;

use super::error::DecodeError;
use crate::value::graph::{Node, Path, Relationship, UnboundRelationship};
use crate::value::{Date, DateTime, Duration, LocalDateTime, LocalTime, Point2D, Point3D, Time};
use crate::value::{Value};

pub(crate) const TAG_NODE: u8 = 0x4E;
pub(crate) const TAG_RELATIONSHIP: u8 = 0x52;
pub(crate) const TAG_UNBOUND_RELATIONSHIP: u8 = 0x72;
pub(crate) const TAG_PATH: u8 = 0x50;
pub(crate) const TAG_POINT_2D: u8 = 0x58;
pub(crate) const TAG_POINT_3D: u8 = 0x59;
pub(crate) const TAG_DATE: u8 = 0x44;
pub(crate) const TAG_TIME: u8 = 0x54;
pub(crate) const TAG_LOCAL_TIME: u8 = 0x74;
pub(crate) const TAG_DATE_TIME_LEGACY: u8 = 0x46;
pub(crate) const TAG_DATE_TIME_OFFSET: u8 = 0x49;
pub(crate) const TAG_DATE_TIME_ZONE_ID: u8 = 0x69;
pub(crate) const TAG_LOCAL_DATE_TIME: u8 = 0x64;
pub(crate) const TAG_DURATION: u8 = 0x45;

fn as_int(v: Value) -> Result<i64, DecodeError> {
    match v {
        Value::Integer(i) => Ok(i),
        other => Err(DecodeError::invalid(format!(
            "expected integer field, got {other:?}"
        ))),
    }
}

fn as_float(v: Value) -> Result<f64, DecodeError> {
    match v {
        Value::Float(f) => Ok(f),
        other => Err(DecodeError::invalid(format!(
            "expected float field, got {other:?}"
        ))),
    }
}

fn as_string(v: Value) -> Result<String, DecodeError> {
    match v {
        Value::String(s) => Ok(s),
        other => Err(DecodeError::invalid(format!(
            "expected string field, got {other:?}"
        ))),
    }
}

fn as_string_list(v: Value) -> Result<Vec<String>, DecodeError> {
    match v {
        Value::List(items) => items.into_iter().map(as_string).collect(),
        other => Err(DecodeError::invalid(format!(
            "expected list field, got {other:?}"
        ))),
    }
}

fn as_properties(v: Value) -> Result<HashMap<String, Value>, DecodeError> {
    match v {
        Value::Map(m) => Ok(m),
        other => Err(DecodeError::invalid(format!(
            "expected properties map, got {other:?}"
        ))),
    }
}

fn as_int_list(v: Value) -> Result<Vec<i64>, DecodeError> {
    match v {
        Value::List(items) => items.into_iter().map(as_int).collect(),
        other => Err(DecodeError::invalid(format!(
            "expected list field, got {other:?}"
        ))),
    }
}

/// Dispatches a decoded `(signature, fields)` pair to a typed `Value`.
/// Unknown signatures fall back to a generic `Value::Structure` so a server
/// newer than this driver degrades gracefully instead of failing to decode.
pub(crate) fn decode_struct(tag: u8, fields: Vec<Value>) -> Result<Value, DecodeError> {
    match (tag, fields.len()) {
        (TAG_NODE, 3) | (TAG_NODE, 4) => {
            let mut it = fields.into_iter();
            let id = as_int(it.next().unwrap())?;
            let labels = as_string_list(it.next().unwrap())?;
            let properties = as_properties(it.next().unwrap())?;
            let element_id = match it.next() {
                Some(v) => as_string(v)?,
                None => String::new(),
            };
            Ok(Value::Node(Node {
                id,
                labels,
                properties,
                element_id,
            }))
        }
        (TAG_RELATIONSHIP, 5) | (TAG_RELATIONSHIP, 6) => {
            let mut it = fields.into_iter();
            let id = as_int(it.next().unwrap())?;
            let start_node_id = as_int(it.next().unwrap())?;
            let end_node_id = as_int(it.next().unwrap())?;
            let type_ = as_string(it.next().unwrap())?;
            let properties = as_properties(it.next().unwrap())?;
            let element_id = it.next().map(as_string).transpose()?.unwrap_or_default();
            Ok(Value::Relationship(Relationship {
                id,
                start_node_id,
                end_node_id,
                type_,
                properties,
                element_id,
                start_node_element_id: String::new(),
                end_node_element_id: String::new(),
            }))
        }
        (TAG_UNBOUND_RELATIONSHIP, 3) | (TAG_UNBOUND_RELATIONSHIP, 4) => {
            let mut it = fields.into_iter();
            let id = as_int(it.next().unwrap())?;
            let type_ = as_string(it.next().unwrap())?;
            let properties = as_properties(it.next().unwrap())?;
            let element_id = it.next().map(as_string).transpose()?.unwrap_or_default();
            Ok(Value::Structure {
                signature: TAG_UNBOUND_RELATIONSHIP,
                fields: vec![
                    Value::Integer(id),
                    Value::String(type_),
                    Value::Map(properties),
                    Value::String(element_id),
                ],
            })
        }
        (TAG_PATH, 3) => {
            let mut it = fields.into_iter();
            let node_values = match it.next().unwrap() {
                Value::List(l) => l,
                other => {
                    return Err(DecodeError::invalid(format!(
                        "expected node list in Path, got {other:?}"
                    )))
                }
            };
            let mut nodes = Vec::with_capacity(node_values.len());
            for n in node_values {
                match n {
                    Value::Node(n) => nodes.push(n),
                    other => {
                        return Err(DecodeError::invalid(format!(
                            "expected Node in Path, got {other:?}"
                        )))
                    }
                }
            }
            let rel_values = match it.next().unwrap() {
                Value::List(l) => l,
                other => {
                    return Err(DecodeError::invalid(format!(
                        "expected relationship list in Path, got {other:?}"
                    )))
                }
            };
            let mut relationships = Vec::with_capacity(rel_values.len());
            for r in rel_values {
                match r {
                    Value::Structure {
                        signature: TAG_UNBOUND_RELATIONSHIP,
                        fields,
                    } => {
                        let mut it = fields.into_iter();
                        let id = as_int(it.next().unwrap())?;
                        let type_ = as_string(it.next().unwrap())?;
                        let properties = as_properties(it.next().unwrap())?;
                        let element_id =
                            it.next().map(as_string).transpose()?.unwrap_or_default();
                        relationships.push(UnboundRelationship {
                            id,
                            type_,
                            properties,
                            element_id,
                        });
                    }
                    other => {
                        return Err(DecodeError::invalid(format!(
                            "expected UnboundRelationship in Path, got {other:?}"
                        )))
                    }
                }
            }
            let indices = as_int_list(it.next().unwrap())?;
            let path = Path::new(nodes, relationships, indices)
                .map_err(|e| DecodeError::invalid(e.to_string()))?;
            Ok(Value::Path(path))
        }
        (TAG_POINT_2D, 3) => {
            let mut it = fields.into_iter();
            let srid = as_int(it.next().unwrap())?;
            let x = as_float(it.next().unwrap())?;
            let y = as_float(it.next().unwrap())?;
            Ok(Value::Point2D(Point2D::with_srid(srid, x, y)))
        }
        (TAG_POINT_3D, 4) => {
            let mut it = fields.into_iter();
            let srid = as_int(it.next().unwrap())?;
            let x = as_float(it.next().unwrap())?;
            let y = as_float(it.next().unwrap())?;
            let z = as_float(it.next().unwrap())?;
            Ok(Value::Point3D(Point3D::with_srid(srid, x, y, z)))
        }
        (TAG_DATE, 1) => {
            let days = as_int(fields.into_iter().next().unwrap())?;
            Ok(Value::Date(Date::from_days_since_epoch(days)))
        }
        (TAG_LOCAL_TIME, 1) => {
            let nanos = as_int(fields.into_iter().next().unwrap())?;
            Ok(Value::LocalTime(LocalTime::from_nanos_since_midnight(
                nanos,
            )))
        }
        (TAG_TIME, 2) => {
            let mut it = fields.into_iter();
            let nanos = as_int(it.next().unwrap())?;
            let offset = as_int(it.next().unwrap())? as i32;
            Ok(Value::Time(Time {
                nanos_since_midnight: nanos,
                tz_offset_seconds: offset,
            }))
        }
        (TAG_LOCAL_DATE_TIME, 2) => {
            let mut it = fields.into_iter();
            let seconds = as_int(it.next().unwrap())?;
            let nanoseconds = as_int(it.next().unwrap())? as u32;
            Ok(Value::LocalDateTime(LocalDateTime {
                epoch_seconds: seconds,
                nanoseconds,
            }))
        }
        (TAG_DATE_TIME_OFFSET, 3) | (TAG_DATE_TIME_LEGACY, 3) => {
            let mut it = fields.into_iter();
            let seconds = as_int(it.next().unwrap())?;
            let nanoseconds = as_int(it.next().unwrap())? as u32;
            let offset_seconds = as_int(it.next().unwrap())? as i32;
            Ok(Value::DateTime(DateTime::Offset {
                epoch_seconds: seconds,
                nanoseconds,
                offset_seconds,
            }))
        }
        (TAG_DATE_TIME_ZONE_ID, 3) => {
            let mut it = fields.into_iter();
            let seconds = as_int(it.next().unwrap())?;
            let nanoseconds = as_int(it.next().unwrap())? as u32;
            let tz_id = as_string(it.next().unwrap())?;
            Ok(Value::DateTime(DateTime::ZoneId {
                epoch_seconds: seconds,
                nanoseconds,
                tz_id,
            }))
        }
        (TAG_DURATION, 4) => {
            let mut it = fields.into_iter();
            let months = as_int(it.next().unwrap())?;
            let days = as_int(it.next().unwrap())?;
            let seconds = as_int(it.next().unwrap())?;
            let nanoseconds = as_int(it.next().unwrap())?;
            Ok(Value::Duration(Duration::new(
                months,
                days,
                seconds,
                nanoseconds,
            )))
        }
        (signature, _) => Ok(Value::Structure { signature, fields }),
    }
}

/// Turns a typed graph/spatial/temporal `Value` variant into the
/// `(signature, fields)` pair `super::encode` writes as a struct. Returns
/// `None` for variants that are not struct-shaped (the caller handles those
/// directly).
pub(crate) fn encode_struct_fields(value: &Value) -> Option<(u8, Vec<Value>)> {
    match value {
        Value::Node(n) => Some((
            TAG_NODE,
            vec![
                Value::Integer(n.id),
                Value::List(n.labels.iter().cloned().map(Value::String).collect()),
                Value::Map(n.properties.clone()),
                Value::String(n.element_id.clone()),
            ],
        )),
        Value::Relationship(r) => Some((
            TAG_RELATIONSHIP,
            vec![
                Value::Integer(r.id),
                Value::Integer(r.start_node_id),
                Value::Integer(r.end_node_id),
                Value::String(r.type_.clone()),
                Value::Map(r.properties.clone()),
                Value::String(r.element_id.clone()),
            ],
        )),
        Value::Point2D(p) => Some((
            TAG_POINT_2D,
            vec![
                Value::Integer(p.srid),
                Value::Float(p.x),
                Value::Float(p.y),
            ],
        )),
        Value::Point3D(p) => Some((
            TAG_POINT_3D,
            vec![
                Value::Integer(p.srid),
                Value::Float(p.x),
                Value::Float(p.y),
                Value::Float(p.z),
            ],
        )),
        Value::Date(d) => Some((TAG_DATE, vec![Value::Integer(d.days_since_epoch())])),
        Value::LocalTime(t) => Some((
            TAG_LOCAL_TIME,
            vec![Value::Integer(t.nanos_since_midnight())],
        )),
        Value::Time(t) => Some((
            TAG_TIME,
            vec![
                Value::Integer(t.nanos_since_midnight),
                Value::Integer(t.tz_offset_seconds as i64),
            ],
        )),
        Value::LocalDateTime(dt) => Some((
            TAG_LOCAL_DATE_TIME,
            vec![
                Value::Integer(dt.epoch_seconds),
                Value::Integer(dt.nanoseconds as i64),
            ],
        )),
        Value::DateTime(DateTime::Offset {
            epoch_seconds,
            nanoseconds,
            offset_seconds,
        }) => Some((
            TAG_DATE_TIME_OFFSET,
            vec![
                Value::Integer(*epoch_seconds),
                Value::Integer(*nanoseconds as i64),
                Value::Integer(*offset_seconds as i64),
            ],
        )),
        Value::DateTime(DateTime::ZoneId {
            epoch_seconds,
            nanoseconds,
            tz_id,
        }) => Some((
            TAG_DATE_TIME_ZONE_ID,
            vec![
                Value::Integer(*epoch_seconds),
                Value::Integer(*nanoseconds as i64),
                Value::String(tz_id.clone()),
            ],
        )),
        Value::Duration(d) => Some((
            TAG_DURATION,
            vec![
                Value::Integer(d.months),
                Value::Integer(d.days),
                Value::Integer(d.seconds),
                Value::Integer(d.nanoseconds),
            ],
        )),
        Value::Path(p) => Some((
            TAG_PATH,
            vec![
                Value::List(p.nodes.iter().cloned().map(Value::Node).collect()),
                Value::List(
                    p.relationships
                        .iter()
                        .map(|r| Value::Structure {
                            signature: TAG_UNBOUND_RELATIONSHIP,
                            fields: vec![
                                Value::Integer(r.id),
                                Value::String(r.type_.clone()),
                                Value::Map(r.properties.clone()),
                                Value::String(r.element_id.clone()),
                            ],
                        })
                        .collect(),
                ),
                Value::List(p.indices.iter().copied().map(Value::Integer).collect()),
            ],
        )),
        _ => None,
    }
}
