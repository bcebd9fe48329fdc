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

//! The byte-stream transport a [`super::connection::Connection`] drives.
//!
//! [`Transport`] is deliberately narrow (connect, read, write, shutdown) so
//! that [`crate::bolt::connection::Connection`] can be driven in tests
//! against an in-memory duplex pipe instead of a real socket (section 8's
//! end-to-end scenarios). [`TcpTransport`] is the only production
//! implementation; this crate has no TLS transport (see `DESIGN.md`).

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::error::{BoltError, Result};

/// A connected byte stream plus the handful of socket options Bolt cares
/// about. Implementors are expected to be blocking: all waiting happens via
/// read/write timeouts, not async polling.
pub trait Transport: Read + Write {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
    fn shutdown(&mut self);
}

/// Plain TCP, `TCP_NODELAY` enabled so chunked Bolt messages aren't held
/// back by Nagle's algorithm waiting to coalesce with more application data.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn connect<A: ToSocketAddrs>(addr: A, connect_timeout: Duration) -> Result<Self> {
        let mut last_err = None;
        for addr in addr.to_socket_addrs().map_err(BoltError::connect)? {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true).map_err(BoltError::connect)?;
                    debug!("C: <OPEN> {addr}");
                    return Ok(Self { stream });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(BoltError::connect(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no addresses to connect to")
        })))
    }
}

impl Read for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Transport for TcpTransport {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_write_timeout(timeout)
    }

    fn shutdown(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
