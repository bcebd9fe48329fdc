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

//! PackStream: Bolt's self-describing binary value encoding (section 4.1).
//!
//! `encode`/`decode` round-trip any [`Value`], including the tagged
//! structures used both for graph/spatial/temporal types and (via
//! [`Value::Structure`]) for Bolt messages themselves.

pub mod error;
mod deserialize;
mod serialize;
mod structs;


pub(crate) use deserialize::decode as decode_value;
pub(crate) use serialize::{PackStreamSerializer, Writer};

use error::EncodeError;
use crate::value::Value;

/// Encodes `value` into a freshly allocated buffer.
///
/// Integer/string/list/map/struct size markers are chosen as the smallest
/// form that fits (section 4.1); map key order is whatever `HashMap`
/// iteration happens to produce, which is fine because decoding is
/// order-insensitive.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    encode_into(value, &mut buf)?;
    Ok(buf)
}

pub(crate) fn encode_into(value: &Value, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    let mut w = Writer::new(buf);
    write_value(&mut w, value)
}

fn write_value<W: std::io::Write>(
    w: &mut serialize::Writer<'_, W>,
    value: &Value,
) -> Result<(), EncodeError> {
    match value {
        Value::Null => w.write_null(),
        Value::Boolean(b) => w.write_bool(*b),
        Value::Integer(i) => w.write_int(*i),
        Value::Float(f) => w.write_float(*f),
        Value::Bytes(b) => w.write_bytes(b),
        Value::String(s) => w.write_string(s),
        Value::List(items) => {
            if items.len() as u64 > u32::MAX as u64 {
                return Err(EncodeError("list exceeds 2^32-1 elements".into()));
            }
            w.write_list_header(items.len() as u64)?;
            for item in items {
                write_value(w, item)?;
            }
            Ok(())
        }
        Value::Map(map) => {
            if map.len() as u64 > u32::MAX as u64 {
                return Err(EncodeError("map exceeds 2^32-1 entries".into()));
            }
            w.write_dict_header(map.len() as u64)?;
            for (k, v) in map {
                w.write_string(k)?;
                write_value(w, v)?;
            }
            Ok(())
        }
        Value::Structure { signature, fields } => write_struct(w, *signature, fields),
        other => match structs::encode_struct_fields(other) {
            Some((tag, fields)) => write_struct(w, tag, &fields),
            None => Err(EncodeError(format!(
                "{other:?} cannot be sent to the server"
            ))),
        },
    }
}

fn write_struct<W: std::io::Write>(
    w: &mut serialize::Writer<'_, W>,
    tag: u8,
    fields: &[Value],
) -> Result<(), EncodeError> {
    if fields.len() > u8::MAX as usize {
        return Err(EncodeError("structure has more than 255 fields".into()));
    }
    w.write_struct_header(tag, fields.len() as u8)?;
    for field in fields {
        write_value(w, field)?;
    }
    Ok(())
}

/// Decodes exactly one value from the front of `input`. See
/// [`deserialize::decode`] for the streaming-tolerant contract.
pub fn decode(input: &[u8]) -> Result<(Value, usize), error::DecodeError> {
    decode_value(input)
}
