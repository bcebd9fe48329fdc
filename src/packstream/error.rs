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

use thiserror::Error;

/// Why [`super::decode`] could not produce a value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The input is a valid prefix of some encoding; more bytes are needed.
    #[error("need more bytes to decode a complete value")]
    NeedMore,
    /// The input can never be completed into a valid encoding (reserved
    /// marker, non-UTF-8 string bytes, dict key that isn't a string, ...).
    #[error("invalid PackStream encoding: {0}")]
    Invalid(String),
}

impl DecodeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Why [`super::encode`] could not produce bytes for a value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot encode value: {0}")]
pub struct EncodeError(pub(crate) String);
