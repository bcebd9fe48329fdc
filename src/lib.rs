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

//! # Bolt Driver Core
//!
//! This crate implements the core of a client library that speaks the Bolt
//! wire protocol (versions 5.1-5.4) to a graph database server (Neo4j or
//! Memgraph): PackStream encoding, handshake/framing/the per-connection
//! state machine, and a session/transaction/pool layer built on top of it.
//!
//! Routing, bookmarks, TLS and multi-database awareness are out of scope
//! (see `DESIGN.md`); this crate talks to exactly one server over a plain
//! TCP connection.
//!
//! ## Basic example
//! ```no_run
//! use std::collections::HashMap;
//!
//! use bolt_driver::address::Address;
//! use bolt_driver::config::auth::AuthToken;
//! use bolt_driver::config::{DriverConfig, PoolConfig};
//! use bolt_driver::pool::Pool;
//! use bolt_driver::session::RunOptions;
//!
//! let address = Address::new("localhost", 7687);
//! let driver_config = DriverConfig::new(AuthToken::new_basic_auth("neo4j", "password"));
//! let pool = Pool::for_address(address, driver_config, PoolConfig::new());
//!
//! let mut session = pool.session().unwrap();
//! let (records, summary) = session
//!     .run("RETURN $x AS x", HashMap::from([("x".to_string(), 1i64.into())]), RunOptions::new())
//!     .unwrap();
//! for record in &records {
//!     println!("{:?}", record.get_by_name("x"));
//! }
//! println!("{:?}", summary.counters);
//! ```
//!
//! ## Concepts
//!
//! - [`packstream`] encodes and decodes the binary [`value::Value`] wire
//!   format carried by every Bolt message.
//! - [`bolt`] speaks the protocol itself: the handshake, chunked framing,
//!   and the per-connection state machine (`bolt::Connection`) that
//!   enforces the legal request/response sequence.
//! - [`pool::Pool`] owns a fixed-size set of connections to one server.
//!   [`pool::Pool::session`] borrows one for a [`session::Session`]'s
//!   lifetime.
//! - [`session::Session`] runs auto-commit queries and opens
//!   [`transaction::Transaction`]s.
//! - [`record_stream::RecordStream`] is the lazy, batched-PULL cursor both
//!   of those hand back.

pub mod address;
pub mod bolt;
pub mod config;
pub mod error;
pub mod packstream;
pub mod pool;
pub mod record;
pub mod record_stream;
pub mod session;
pub mod summary;
pub mod transaction;
pub mod value;

pub use error::{BoltError, Result};
pub use record::Record;
pub use session::Session;
pub use value::Value;
