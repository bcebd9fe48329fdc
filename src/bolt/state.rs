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

//! The per-connection protocol state machine (section 4.4).
//!
//! The teacher tracks state as a bare enum that a surrounding `match`
//! advances by hand per message kind, panicking on an illegal transition.
//! Here the states and the messages that drive them are both represented as
//! tagged enums and the legality check lives in one place, [`ConnectionState::advance`],
//! which returns a typed error instead of panicking: a protocol violation is
//! a server bug or a wire-format mismatch, not a condition this crate should
//! ever turn into a process abort.

use crate::error::{BoltError, Result};

/// The state a [`super::connection::Connection`] is in, per section 4.4's
/// diagram. `TxStreaming` collapses the teacher's distinction between
/// "streaming with all results still open" and "some results exhausted" into
/// a single state, since tracking open result counts is not needed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Negotiating,
    Authenticating,
    Ready,
    Streaming,
    TxReady,
    TxStreaming,
    Failed,
    Defunct,
}

/// The event that drives a state transition: either a request being sent, or
/// a terminal reply being received for the request currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Connected,
    HandshakeOk,
    HelloOrLogonSuccess,
    HelloOrLogonFailure,
    Run,
    Begin,
    PullOrDiscardHasMore,
    PullOrDiscardDone,
    RecordReceived,
    Commit,
    Rollback,
    Failure,
    Reset,
    Goodbye,
}

impl ConnectionState {
    /// Applies `event`, returning the new state, or a [`BoltError::ProtocolError`]
    /// if `event` is illegal in the current state.
    pub(crate) fn advance(self, event: Event) -> Result<Self> {
        use ConnectionState::*;
        use Event::*;

        let next = match (self, event) {
            (Disconnected, Connected) => Negotiating,
            (Negotiating, HandshakeOk) => Authenticating,
            (Authenticating, HelloOrLogonSuccess) => Ready,
            (Authenticating, HelloOrLogonFailure) => Defunct,

            (Ready, Run) => Streaming,
            (Streaming, PullOrDiscardHasMore) => Streaming,
            (Streaming, RecordReceived) => Streaming,
            (Streaming, PullOrDiscardDone) => Ready,
            (Streaming, Failure) => Failed,
            (Ready, Failure) => Failed,

            (Ready, Begin) => TxReady,
            (TxReady, Run) => TxStreaming,
            (TxStreaming, PullOrDiscardHasMore) => TxStreaming,
            (TxStreaming, RecordReceived) => TxStreaming,
            (TxStreaming, PullOrDiscardDone) => TxReady,
            (TxStreaming, Failure) => Failed,
            (TxReady, Failure) => Failed,
            (TxReady, Commit) => Ready,
            (TxReady, Rollback) => Ready,

            (Failed, Reset) => Ready,

            // GOODBYE is legal from any non-terminal state.
            (Defunct, Goodbye) | (Disconnected, Goodbye) => Defunct,
            (_, Goodbye) => Defunct,

            (state, event) => {
                return Err(BoltError::protocol(format!(
                    "illegal transition: {event:?} while in state {state:?}"
                )))
            }
        };
        Ok(next)
    }

    /// Whether a RUN (auto-commit or in an open transaction) is currently
    /// legal to send.
    pub(crate) fn can_run(self) -> bool {
        matches!(self, ConnectionState::Ready | ConnectionState::TxReady)
    }

    /// Whether a PULL/DISCARD is currently legal to send. Per section 8,
    /// PULL without a prior RUN must be rejected locally, without writing
    /// to the wire.
    pub(crate) fn can_pull(self) -> bool {
        matches!(self, ConnectionState::Streaming | ConnectionState::TxStreaming)
    }

    pub(crate) fn is_defunct(self) -> bool {
        self == ConnectionState::Defunct
    }
}
