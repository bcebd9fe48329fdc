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
use std::io;

use log::info;
use thiserror::Error;

use crate::value::Value;

/// Errors produced by this crate.
///
/// **Note:** error messages are not part of the crate's semver-relevant API
/// and may change at any time. The only string that can be relied upon is
/// [`ServerError::code`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BoltError {
    /// TCP connect failed, the socket was reset, or EOF was hit mid-message.
    #[error("connection failed: {message}{}",
            source.as_ref().map(|e| format!(" (caused by: {e})")).unwrap_or_default())]
    ConnectionFailed {
        message: String,
        source: Option<io::Error>,
    },

    /// No protocol version could be agreed with the server, or the server's
    /// handshake reply was malformed.
    #[error("handshake failed: {message}")]
    HandshakeFailed { message: String },

    /// The server replied with FAILURE to HELLO/LOGON.
    #[error("authentication failed: {error}")]
    AuthFailed { error: ServerError },

    /// An illegal local state transition, an unexpected message signature, a
    /// malformed chunked message, or an invalid PackStream encoding.
    #[error("protocol error: {message}")]
    ProtocolError { message: String },

    /// The server replied with FAILURE to RUN/PULL/DISCARD/BEGIN/COMMIT/
    /// ROLLBACK.
    #[error("query failed: {error}")]
    QueryFailed { error: ServerError },

    /// A transport read or write exceeded its configured deadline.
    #[error("{message}")]
    Timeout { message: String },

    /// Checking out a connection from the pool timed out with none
    /// available.
    #[error("pool exhausted: {message}")]
    PoolExhausted { message: String },

    /// An unsupported URI scheme, a bad configuration option, or a value
    /// that cannot be encoded (e.g. a collection with more than `i64::MAX`
    /// elements).
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl BoltError {
    pub(crate) fn connect(err: io::Error) -> Self {
        info!("connect error: {err}");
        Self::ConnectionFailed {
            message: "failed to open connection".into(),
            source: Some(err),
        }
    }

    pub(crate) fn read(err: io::Error) -> Self {
        info!("read error: {err}");
        Self::ConnectionFailed {
            message: "failed to read from socket".into(),
            source: Some(err),
        }
    }

    pub(crate) fn write(err: io::Error) -> Self {
        info!("write error: {err}");
        Self::ConnectionFailed {
            message: "failed to write to socket".into(),
            source: Some(err),
        }
    }

    pub(crate) fn disconnected<S: Into<String>>(message: S) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn protocol<S: Into<String>>(message: S) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    pub(crate) fn handshake<S: Into<String>>(message: S) -> Self {
        Self::HandshakeFailed {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub(crate) fn pool_exhausted<S: Into<String>>(message: S) -> Self {
        Self::PoolExhausted {
            message: message.into(),
        }
    }

    /// Whether retrying the operation that produced this error might
    /// succeed. Retrying itself is left to the caller (section 7: "the pool
    /// never retries transparently").
    pub fn is_retryable(&self) -> bool {
        match self {
            BoltError::QueryFailed { error } => error.is_retryable(),
            BoltError::ConnectionFailed { .. } => true,
            _ => false,
        }
    }
}

/// A structured error reported by the server in a FAILURE message.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ServerError {
    pub code: String,
    pub message: String,
}

const UNKNOWN_CODE: &str = "Neo.DatabaseError.General.UnknownError";
const UNKNOWN_MESSAGE: &str = "server sent a FAILURE with no code/message";

impl ServerError {
    pub(crate) fn from_meta(mut meta: HashMap<String, Value>) -> Self {
        let code = match meta.remove("code") {
            Some(Value::String(code)) => code,
            _ => UNKNOWN_CODE.into(),
        };
        let message = match meta.remove("message") {
            Some(Value::String(message)) => message,
            _ => UNKNOWN_MESSAGE.into(),
        };
        Self { code, message }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The classification segment of the code, e.g. `ClientError` in
    /// `Neo.ClientError.Statement.SyntaxError`.
    pub fn classification(&self) -> &str {
        self.code.split('.').nth(1).unwrap_or("")
    }

    pub(crate) fn is_retryable(&self) -> bool {
        matches!(
            self.code(),
            "Neo.ClientError.Security.AuthorizationExpired"
                | "Neo.ClientError.Cluster.NotALeader"
                | "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase"
        ) || self.classification() == "TransientError"
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

pub type Result<T> = std::result::Result<T, BoltError>;
