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

use std::collections::HashMap;

use super::error::DecodeError;
use super::structs;
use crate::value::Value;

/// Decodes one value from the front of `input`, over a byte slice rather
/// than a blocking `Read`: per section 4.1, decoding must be
/// streaming-tolerant, returning [`DecodeError::NeedMore`] rather than
/// erroring when `input` is merely a prefix of a valid encoding. A
/// `Read`-based decoder can't distinguish "prefix, try again later" from
/// "truly malformed" without this slice-oriented cursor.
pub(crate) struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.input.len() {
            return Err(DecodeError::NeedMore);
        }
        let slice = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn take_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.take(1)?[0] as i8)
    }

    fn take_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn take_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn take_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn take_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn take_u8_len(&mut self) -> Result<usize, DecodeError> {
        Ok(self.take_u8()? as usize)
    }

    fn take_u16_len(&mut self) -> Result<usize, DecodeError> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()) as usize)
    }

    fn take_u32_len(&mut self) -> Result<usize, DecodeError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()) as usize)
    }

    fn take_string(&mut self, len: usize) -> Result<String, DecodeError> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| DecodeError::invalid("string field is not valid UTF-8"))
    }

    pub(crate) fn decode(&mut self) -> Result<Value, DecodeError> {
        let marker = self.take_u8()?;
        self.decode_from_marker(marker)
    }

    fn decode_from_marker(&mut self, marker: u8) -> Result<Value, DecodeError> {
        match marker {
            0xC0 => Ok(Value::Null),
            0xC2 => Ok(Value::Boolean(false)),
            0xC3 => Ok(Value::Boolean(true)),
            0x00..=0x7F => Ok(Value::Integer(marker as i8 as i64)),
            0xF0..=0xFF => Ok(Value::Integer(marker as i8 as i64)),
            0xC8 => Ok(Value::Integer(self.take_i8()? as i64)),
            0xC9 => Ok(Value::Integer(self.take_i16()? as i64)),
            0xCA => Ok(Value::Integer(self.take_i32()? as i64)),
            0xCB => Ok(Value::Integer(self.take_i64()?)),
            0xC1 => Ok(Value::Float(self.take_f64()?)),
            0xCC => {
                let len = self.take_u8_len()?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            0xCD => {
                let len = self.take_u16_len()?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            0xCE => {
                let len = self.take_u32_len()?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            0x80..=0x8F => {
                let len = (marker - 0x80) as usize;
                Ok(Value::String(self.take_string(len)?))
            }
            0xD0 => {
                let len = self.take_u8_len()?;
                Ok(Value::String(self.take_string(len)?))
            }
            0xD1 => {
                let len = self.take_u16_len()?;
                Ok(Value::String(self.take_string(len)?))
            }
            0xD2 => {
                let len = self.take_u32_len()?;
                Ok(Value::String(self.take_string(len)?))
            }
            0x90..=0x9F => {
                let len = (marker - 0x90) as usize;
                self.decode_list(len)
            }
            0xD4 => {
                let len = self.take_u8_len()?;
                self.decode_list(len)
            }
            0xD5 => {
                let len = self.take_u16_len()?;
                self.decode_list(len)
            }
            0xD6 => {
                let len = self.take_u32_len()?;
                self.decode_list(len)
            }
            0xA0..=0xAF => {
                let len = (marker - 0xA0) as usize;
                self.decode_map(len)
            }
            0xD8 => {
                let len = self.take_u8_len()?;
                self.decode_map(len)
            }
            0xD9 => {
                let len = self.take_u16_len()?;
                self.decode_map(len)
            }
            0xDA => {
                let len = self.take_u32_len()?;
                self.decode_map(len)
            }
            0xB0..=0xBF => {
                let len = (marker - 0xB0) as usize;
                let tag = self.take_u8()?;
                self.decode_struct(tag, len)
            }
            0xDC => {
                let len = self.take_u8_len()?;
                let tag = self.take_u8()?;
                self.decode_struct(tag, len)
            }
            0xDD => {
                let len = self.take_u16_len()?;
                let tag = self.take_u8()?;
                self.decode_struct(tag, len)
            }
            _ => Err(DecodeError::invalid(format!(
                "unknown or reserved marker byte {marker:#04X}"
            ))),
        }
    }

    fn decode_list(&mut self, len: usize) -> Result<Value, DecodeError> {
        let mut items = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(Value::List(items))
    }

    fn decode_map(&mut self, len: usize) -> Result<Value, DecodeError> {
        let mut map = HashMap::with_capacity(len.min(4096));
        for _ in 0..len {
            let key = match self.decode()? {
                Value::String(s) => s,
                other => {
                    return Err(DecodeError::invalid(format!(
                        "map key must be a string, got {other:?}"
                    )))
                }
            };
            let value = self.decode()?;
            // Last-write-wins, per section 3.
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn decode_struct(&mut self, tag: u8, len: usize) -> Result<Value, DecodeError> {
        let mut fields = Vec::with_capacity(len.min(64));
        for _ in 0..len {
            fields.push(self.decode()?);
        }
        structs::decode_struct(tag, fields)
    }
}

/// Decodes exactly one value from the front of `input`, returning the value
/// and the number of bytes consumed. Any bytes beyond that are simply not
/// consumed (the caller, typically the framing layer handing over one
/// dechunked message, decides whether leftover bytes are an error).
pub fn decode(input: &[u8]) -> Result<(Value, usize), DecodeError> {
    let mut decoder = Decoder::new(input);
    let value = decoder.decode()?;
    Ok((value, decoder.position()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_null() {
        assert_eq!(decode(&[0xC0]).unwrap().0, Value::Null);
    }

    #[test]
    fn decode_needs_more_on_truncated_input() {
        // 0xC9 expects a 16-bit int to follow; give only one byte of it.
        let err = decode(&[0xC9, 0x01]).unwrap_err();
        assert_eq!(err, DecodeError::NeedMore);
    }

    #[test]
    fn decode_rejects_reserved_marker() {
        let err = decode(&[0xC4]).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid(_)));
    }

    #[test]
    fn decode_rejects_non_utf8_string() {
        let err = decode(&[0x81, 0xFF]).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid(_)));
    }

    #[test]
    fn decode_leaves_trailing_bytes_unconsumed() {
        let (value, consumed) = decode(&[0xC0, 0xC3]).unwrap();
        assert_eq!(value, Value::Null);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn map_decode_is_last_write_wins() {
        // tiny-map with two identical keys "a" -> 1, "a" -> 2
        let mut bytes = vec![0xA2];
        bytes.extend_from_slice(&[0x81, b'a', 0x01]);
        bytes.extend_from_slice(&[0x81, b'a', 0x02]);
        let (value, _) = decode(&bytes).unwrap();
        let Value::Map(map) = value else {
            panic!("expected map")
        };
        assert_eq!(map.get("a"), Some(&Value::Integer(2)));
    }
}
