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

//! Wire-level temporal types.
//!
//! These types only specify how a value round-trips over PackStream; they do
//! not implement calendar arithmetic (adding durations to dates, resolving a
//! zone id to a UTC offset at a given instant, etc.), which is explicitly out
//! of scope for this crate.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Days since 1970-01-01, as carried by the `Date` structure (signature
/// `0x44`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date(pub i64);

impl Date {
    pub fn from_days_since_epoch(days: i64) -> Self {
        Self(days)
    }

    pub fn days_since_epoch(&self) -> i64 {
        self.0
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::Duration::days(self.0))
    }

    pub fn from_naive_date(date: NaiveDate) -> Self {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("1970-01-01 is a valid date");
        Self((date - epoch).num_days())
    }
}

/// Nanoseconds since midnight, as carried by the `LocalTime` structure
/// (signature `0x74`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime(pub i64);

impl LocalTime {
    pub fn from_nanos_since_midnight(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn nanos_since_midnight(&self) -> i64 {
        self.0
    }

    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        let secs = (self.0 / 1_000_000_000) as u32;
        let nanos = (self.0 % 1_000_000_000) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
    }
}

/// A time of day with a UTC offset, as carried by the `Time` structure
/// (signature `0x54`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub nanos_since_midnight: i64,
    pub tz_offset_seconds: i32,
}

/// An instant with nanosecond precision but no date, as carried by the
/// `LocalDateTime` structure (signature `0x64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDateTime {
    pub epoch_seconds: i64,
    pub nanoseconds: u32,
}

impl LocalDateTime {
    pub fn to_naive_date_time(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::from_timestamp_opt(self.epoch_seconds, self.nanoseconds)
    }
}

/// A zoned instant, as carried by the `DateTime` family of structures
/// (signatures `0x46` legacy, `0x49` UTC-offset, `0x69` named zone).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateTime {
    /// Carries a fixed UTC offset (legacy signature `0x46` decodes into this
    /// variant too: this crate does not replicate the pre-4.3 legacy offset
    /// bug, it treats both signatures identically on decode and always
    /// encodes the non-legacy form).
    Offset {
        epoch_seconds: i64,
        nanoseconds: u32,
        offset_seconds: i32,
    },
    /// Carries an IANA time zone id. Resolving `tz_id` plus `epoch_seconds`
    /// into a wall-clock local time is calendar arithmetic and therefore out
    /// of scope; the raw fields are preserved as received.
    ZoneId {
        epoch_seconds: i64,
        nanoseconds: u32,
        tz_id: String,
    },
}

impl DateTime {
    /// Resolves a `ZoneId` variant's `tz_id` into a [`chrono_tz::Tz`] and
    /// combines it with the instant to produce a `chrono::DateTime`. Looking
    /// up the zone by name is not calendar arithmetic; it is `None` for
    /// `Offset` (no named zone to resolve) and for an unrecognized id.
    pub fn to_chrono_tz(&self) -> Option<chrono::DateTime<chrono_tz::Tz>> {
        let DateTime::ZoneId {
            epoch_seconds,
            nanoseconds,
            tz_id,
        } = self
        else {
            return None;
        };
        let tz = chrono_tz::Tz::from_str(tz_id).ok()?;
        let naive = NaiveDateTime::from_timestamp_opt(*epoch_seconds, *nanoseconds)?;
        Some(tz.from_utc_datetime(&naive))
    }
}

/// A calendar duration, as carried by the `Duration` structure (signature
/// `0x45`). Each component is independent and signed; no normalization
/// (e.g. folding seconds into days) is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i64,
}

impl Duration {
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i64) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_id_resolves_to_chrono_tz() {
        let dt = DateTime::ZoneId {
            epoch_seconds: 0,
            nanoseconds: 0,
            tz_id: "Europe/Berlin".to_string(),
        };
        let resolved = dt.to_chrono_tz().unwrap();
        assert_eq!(resolved.timezone(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn unknown_zone_id_does_not_resolve() {
        let dt = DateTime::ZoneId {
            epoch_seconds: 0,
            nanoseconds: 0,
            tz_id: "Not/AZone".to_string(),
        };
        assert!(dt.to_chrono_tz().is_none());
    }

    #[test]
    fn offset_variant_has_no_named_zone_to_resolve() {
        let dt = DateTime::Offset {
            epoch_seconds: 0,
            nanoseconds: 0,
            offset_seconds: 3600,
        };
        assert!(dt.to_chrono_tz().is_none());
    }
}
