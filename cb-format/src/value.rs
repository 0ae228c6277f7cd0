//! Fixed-width value types carried by fields

use crate::constants::OBJECT_ID_LEN;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Ticks (100ns units) per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Tick count of 1970-01-01T00:00:00Z measured from 0001-01-01.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Point in time as signed 100ns ticks since 0001-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CbDateTime(pub i64);

impl CbDateTime {
    /// Build from a raw tick count.
    pub const fn from_ticks(ticks: i64) -> Self {
        CbDateTime(ticks)
    }

    /// Raw tick count.
    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// Convert from a UTC `chrono` timestamp; sub-tick precision is truncated.
    ///
    /// Saturates for instants outside the representable tick range.
    pub fn from_chrono(value: DateTime<Utc>) -> Self {
        let seconds = value.timestamp();
        let sub_ticks = (value.timestamp_subsec_nanos() / 100) as i64;
        let ticks = seconds
            .saturating_mul(TICKS_PER_SECOND)
            .saturating_add(sub_ticks)
            .saturating_add(UNIX_EPOCH_TICKS);
        CbDateTime(ticks)
    }

    /// Convert to a UTC `chrono` timestamp, if representable.
    pub fn to_chrono(self) -> Option<DateTime<Utc>> {
        let since_epoch = self.0.checked_sub(UNIX_EPOCH_TICKS)?;
        let seconds = since_epoch.div_euclid(TICKS_PER_SECOND);
        let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
        DateTime::from_timestamp(seconds, nanos)
    }
}

impl fmt::Display for CbDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_chrono() {
            Some(value) => write!(f, "{}", value.to_rfc3339()),
            None => write!(f, "{} ticks", self.0),
        }
    }
}

/// Duration as signed 100ns ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CbTimeSpan(pub i64);

impl CbTimeSpan {
    /// Build from a raw tick count.
    pub const fn from_ticks(ticks: i64) -> Self {
        CbTimeSpan(ticks)
    }

    /// Raw tick count.
    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// Build from whole seconds, saturating on overflow.
    pub const fn from_seconds(seconds: i64) -> Self {
        CbTimeSpan(seconds.saturating_mul(TICKS_PER_SECOND))
    }

    /// Convert from a `chrono` duration; sub-tick precision is truncated.
    pub fn from_chrono(value: TimeDelta) -> Self {
        let ticks = value
            .num_seconds()
            .saturating_mul(TICKS_PER_SECOND)
            .saturating_add((value.subsec_nanos() / 100) as i64);
        CbTimeSpan(ticks)
    }

    /// Convert to a `chrono` duration.
    pub fn to_chrono(self) -> TimeDelta {
        TimeDelta::seconds(self.0 / TICKS_PER_SECOND)
            + TimeDelta::nanoseconds((self.0 % TICKS_PER_SECOND) * 100)
    }
}

/// 12-byte object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CbObjectId(pub [u8; OBJECT_ID_LEN]);

impl CbObjectId {
    /// Build from a 12-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; OBJECT_ID_LEN]>::try_from(bytes).ok().map(CbObjectId)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for CbObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unix_epoch() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(CbDateTime::from_chrono(epoch).ticks(), UNIX_EPOCH_TICKS);
        assert_eq!(CbDateTime(UNIX_EPOCH_TICKS).to_chrono(), Some(epoch));
    }

    #[test]
    fn test_date_time_chrono_roundtrip() {
        let value = Utc.with_ymd_and_hms(2024, 2, 29, 13, 37, 5).unwrap()
            + TimeDelta::nanoseconds(123_456_700);
        let ticks = CbDateTime::from_chrono(value);
        assert_eq!(ticks.to_chrono(), Some(value));
    }

    #[test]
    fn test_date_time_before_epoch() {
        let value = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap()
            + TimeDelta::nanoseconds(500);
        let ticks = CbDateTime::from_chrono(value);
        assert!(ticks.ticks() < UNIX_EPOCH_TICKS);
        assert_eq!(ticks.to_chrono(), Some(value));
    }

    #[test]
    fn test_date_time_display() {
        let value = CbDateTime(UNIX_EPOCH_TICKS);
        assert_eq!(value.to_string(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_time_span() {
        assert_eq!(CbTimeSpan::from_seconds(3).ticks(), 30_000_000);
        let span = TimeDelta::milliseconds(1_500);
        assert_eq!(CbTimeSpan::from_chrono(span).ticks(), 15_000_000);
        assert_eq!(CbTimeSpan(15_000_000).to_chrono(), span);
        assert_eq!(CbTimeSpan(-15_000_000).to_chrono(), -span);
    }

    #[test]
    fn test_object_id() {
        let id = CbObjectId::from_slice(&[0xab; 12]).unwrap();
        assert_eq!(id.to_string(), "ab".repeat(12));
        assert!(CbObjectId::from_slice(&[0; 11]).is_none());
    }
}
