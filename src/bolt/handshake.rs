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

//! Bolt handshake: magic bytes plus four 4-byte version proposals, in
//! preference order (section 4.3). This crate proposes every version it
//! supports (5.1 through 5.4, newest first) and leaves the remaining slots
//! zeroed.

use crate::error::{BoltError, Result};

pub(crate) const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Versions this driver is willing to speak, newest first. Bumping the
/// highest supported minor version only requires adding an entry here.
pub(crate) const SUPPORTED_VERSIONS: [(u8, u8); 4] = [(5, 4), (5, 3), (5, 2), (5, 1)];

/// Builds the 16-byte version-proposal block sent right after the magic.
pub(crate) fn version_proposal() -> [u8; 16] {
    let mut offer = [0u8; 16];
    for (i, &(major, minor)) in SUPPORTED_VERSIONS.iter().enumerate() {
        let slot = &mut offer[i * 4..i * 4 + 4];
        slot.copy_from_slice(&[0, 0, minor, major]);
    }
    offer
}

/// Parses the server's 4-byte handshake reply into an agreed `(major,
/// minor)`, tolerating both the documented `00 00 minor major` encoding and
/// the historical `minor 00 00 major` one.
pub(crate) fn decode_agreed_version(reply: &[u8; 4]) -> Result<(u8, u8)> {
    if reply == &[0, 0, 0, 0] {
        return Err(BoltError::handshake(
            "server reported no overlapping Bolt version",
        ));
    }
    let candidates = [(reply[3], reply[2]), (reply[0], reply[3])];
    for (major, minor) in candidates {
        if SUPPORTED_VERSIONS.contains(&(major, minor)) {
            return Ok((major, minor));
        }
    }
    Err(BoltError::handshake(format!(
        "server proposed unsupported Bolt version, raw reply {reply:02X?}"
    )))
}
