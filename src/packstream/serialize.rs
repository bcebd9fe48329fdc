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

use std::io::Write;

use super::error::EncodeError;

/// Low-level PackStream marker writer. [`super::encode`] drives this to turn
/// a [`crate::value::Value`] into bytes; kept as a trait (rather than a bare
/// function) so the struct-encoding code in `super::encode` doesn't need to
/// know about `Value` at all, only about markers.
pub(crate) trait PackStreamSerializer {
    fn write_null(&mut self) -> Result<(), EncodeError>;
    fn write_bool(&mut self, b: bool) -> Result<(), EncodeError>;
    fn write_int(&mut self, i: i64) -> Result<(), EncodeError>;
    fn write_float(&mut self, f: f64) -> Result<(), EncodeError>;
    fn write_bytes(&mut self, b: &[u8]) -> Result<(), EncodeError>;
    fn write_string(&mut self, s: &str) -> Result<(), EncodeError>;
    fn write_list_header(&mut self, size: u64) -> Result<(), EncodeError>;
    fn write_dict_header(&mut self, size: u64) -> Result<(), EncodeError>;
    fn write_struct_header(&mut self, tag: u8, size: u8) -> Result<(), EncodeError>;
}

fn io_err(e: std::io::Error) -> EncodeError {
    EncodeError(format!("write failed: {e}"))
}

pub(crate) struct Writer<'a, W: Write> {
    out: &'a mut W,
}

impl<'a, W: Write> Writer<'a, W> {
    pub(crate) fn new(out: &'a mut W) -> Self {
        Self { out }
    }
}

impl<W: Write> PackStreamSerializer for Writer<'_, W> {
    fn write_null(&mut self) -> Result<(), EncodeError> {
        self.out.write_all(&[0xC0]).map_err(io_err)
    }

    fn write_bool(&mut self, b: bool) -> Result<(), EncodeError> {
        self.out.write_all(&[if b { 0xC3 } else { 0xC2 }]).map_err(io_err)
    }

    fn write_int(&mut self, i: i64) -> Result<(), EncodeError> {
        if (-16..=127).contains(&i) {
            self.out.write_all(&i8::to_be_bytes(i as i8)).map_err(io_err)
        } else if (i8::MIN as i64..=i8::MAX as i64).contains(&i) {
            self.out.write_all(&[0xC8]).map_err(io_err)?;
            self.out.write_all(&i8::to_be_bytes(i as i8)).map_err(io_err)
        } else if (i16::MIN as i64..=i16::MAX as i64).contains(&i) {
            self.out.write_all(&[0xC9]).map_err(io_err)?;
            self.out.write_all(&i16::to_be_bytes(i as i16)).map_err(io_err)
        } else if (i32::MIN as i64..=i32::MAX as i64).contains(&i) {
            self.out.write_all(&[0xCA]).map_err(io_err)?;
            self.out.write_all(&i32::to_be_bytes(i as i32)).map_err(io_err)
        } else {
            self.out.write_all(&[0xCB]).map_err(io_err)?;
            self.out.write_all(&i64::to_be_bytes(i)).map_err(io_err)
        }
    }

    fn write_float(&mut self, f: f64) -> Result<(), EncodeError> {
        self.out.write_all(&[0xC1]).map_err(io_err)?;
        self.out.write_all(&f64::to_be_bytes(f)).map_err(io_err)
    }

    fn write_bytes(&mut self, b: &[u8]) -> Result<(), EncodeError> {
        let size = b.len();
        if size <= u8::MAX as usize {
            self.out.write_all(&[0xCC]).map_err(io_err)?;
            self.out.write_all(&(size as u8).to_be_bytes()).map_err(io_err)?;
        } else if size <= u16::MAX as usize {
            self.out.write_all(&[0xCD]).map_err(io_err)?;
            self.out.write_all(&(size as u16).to_be_bytes()).map_err(io_err)?;
        } else if size <= u32::MAX as usize {
            self.out.write_all(&[0xCE]).map_err(io_err)?;
            self.out.write_all(&(size as u32).to_be_bytes()).map_err(io_err)?;
        } else {
            return Err(EncodeError("byte string exceeds 2^32-1 bytes".into()));
        }
        self.out.write_all(b).map_err(io_err)
    }

    fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        let bytes = s.as_bytes();
        let size = bytes.len();
        if size <= 15 {
            self.out.write_all(&[0x80 + size as u8]).map_err(io_err)?;
        } else if size <= u8::MAX as usize {
            self.out.write_all(&[0xD0]).map_err(io_err)?;
            self.out.write_all(&(size as u8).to_be_bytes()).map_err(io_err)?;
        } else if size <= u16::MAX as usize {
            self.out.write_all(&[0xD1]).map_err(io_err)?;
            self.out.write_all(&(size as u16).to_be_bytes()).map_err(io_err)?;
        } else if size <= u32::MAX as usize {
            self.out.write_all(&[0xD2]).map_err(io_err)?;
            self.out.write_all(&(size as u32).to_be_bytes()).map_err(io_err)?;
        } else {
            return Err(EncodeError("string exceeds 2^32-1 bytes".into()));
        }
        self.out.write_all(bytes).map_err(io_err)
    }

    fn write_list_header(&mut self, size: u64) -> Result<(), EncodeError> {
        if size <= 15 {
            self.out.write_all(&[0x90 + size as u8]).map_err(io_err)
        } else if size <= u8::MAX as u64 {
            self.out.write_all(&[0xD4]).map_err(io_err)?;
            self.out.write_all(&(size as u8).to_be_bytes()).map_err(io_err)
        } else if size <= u16::MAX as u64 {
            self.out.write_all(&[0xD5]).map_err(io_err)?;
            self.out.write_all(&(size as u16).to_be_bytes()).map_err(io_err)
        } else if size <= u32::MAX as u64 {
            self.out.write_all(&[0xD6]).map_err(io_err)?;
            self.out.write_all(&(size as u32).to_be_bytes()).map_err(io_err)
        } else {
            Err(EncodeError("list exceeds 2^32-1 elements".into()))
        }
    }

    fn write_dict_header(&mut self, size: u64) -> Result<(), EncodeError> {
        if size <= 15 {
            self.out.write_all(&[0xA0 + size as u8]).map_err(io_err)
        } else if size <= u8::MAX as u64 {
            self.out.write_all(&[0xD8]).map_err(io_err)?;
            self.out.write_all(&(size as u8).to_be_bytes()).map_err(io_err)
        } else if size <= u16::MAX as u64 {
            self.out.write_all(&[0xD9]).map_err(io_err)?;
            self.out.write_all(&(size as u16).to_be_bytes()).map_err(io_err)
        } else if size <= u32::MAX as u64 {
            self.out.write_all(&[0xDA]).map_err(io_err)?;
            self.out.write_all(&(size as u32).to_be_bytes()).map_err(io_err)
        } else {
            Err(EncodeError("map exceeds 2^32-1 entries".into()))
        }
    }

    fn write_struct_header(&mut self, tag: u8, size: u8) -> Result<(), EncodeError> {
        if size <= 15 {
            self.out.write_all(&[0xB0 + size, tag]).map_err(io_err)
        } else {
            self.out.write_all(&[0xDC]).map_err(io_err)?;
            self.out.write_all(&[size]).map_err(io_err)?;
            self.out.write_all(&[tag]).map_err(io_err)
        }
    }
}

/// The size of a struct header's field count never exceeds `u8`, but the
/// wire grid also allows a `0xDD` (`u16` length) form for structures with
/// more than 255 fields. No message or graph type in scope ever needs it;
/// [`write_struct_header`](PackStreamSerializer::write_struct_header) only
/// emits the `u8` form.
#[allow(dead_code)]
pub(crate) const STRUCT_HEADER_U16_MARKER: u8 = 0xDD;
