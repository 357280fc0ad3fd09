//! MS-DOS date/time packing for zip entry headers.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// A packed MS-DOS date/time pair as stored in zip headers.
///
/// `date = (year - 1980) << 9 | month << 5 | day`,
/// `time = hour << 11 | minute << 5 | second / 2`.
///
/// The encoding only represents 1980-01-01 through 2107-12-31 at two-second
/// resolution; moments outside that range are clamped to the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    /// Earliest representable moment, 1980-01-01 00:00:00.
    pub const EPOCH: Self = Self {
        date: (1 << 5) | 1,
        time: 0,
    };

    /// Latest representable moment, 2107-12-31 23:59:58.
    pub const MAX: Self = Self {
        date: (127 << 9) | (12 << 5) | 31,
        time: (23 << 11) | (59 << 5) | 29,
    };

    /// Pack a UTC timestamp into DOS date/time fields.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        let year = dt.year();
        if year < 1980 {
            return Self::EPOCH;
        }
        if year > 2107 {
            return Self::MAX;
        }

        let date = (((year - 1980) as u16) << 9)
            | ((dt.month() as u16) << 5)
            | dt.day() as u16;
        let time = ((dt.hour() as u16) << 11)
            | ((dt.minute() as u16) << 5)
            | (dt.second() as u16 / 2);

        Self { date, time }
    }
}
