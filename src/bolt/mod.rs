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

//! The Bolt framing and protocol engine (section 2): handshake, chunking,
//! the per-connection state machine, and message construction/classification.

mod chunk;
pub(crate) mod connection;
mod handshake;
pub(crate) mod message;
pub mod socket;
mod state;

pub use connection::Connection;
pub use socket::{TcpTransport, Transport};
pub use state::ConnectionState;
