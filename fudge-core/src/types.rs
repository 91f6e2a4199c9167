/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Wire type identifiers and the date/time value types.
//!
//! This module provides:
//! - [`WireType`]: The closed set of built-in wire types plus an escape
//!   hatch for ids registered at context construction
//! - [`FudgeDate`], [`FudgeTime`], [`FudgeDateTime`]: calendar values with
//!   the bit-packed wire representations defined by the encoding
//!   specification
//! - [`Precision`]: the accuracy marker carried by time values

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// A Fudge wire type.
///
/// Each variant corresponds to a stable one-byte type id. The id
/// assignments are part of the interchange contract and must not change.
/// Ids outside the built-in set are represented as [`WireType::Other`],
/// carrying the fixed width when one was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Presence-only marker, zero payload bytes (id 0).
    Indicator,
    /// Boolean, one byte holding 0 or 1 (id 1).
    Boolean,
    /// Signed 8-bit integer (id 2).
    Byte,
    /// Signed 16-bit integer (id 3).
    Short,
    /// Signed 32-bit integer (id 4).
    Int,
    /// Signed 64-bit integer (id 5).
    Long,
    /// Variable-length byte array (id 6).
    ByteArray,
    /// Array of signed 16-bit integers (id 7).
    ShortArray,
    /// Array of signed 32-bit integers (id 8).
    IntArray,
    /// Array of signed 64-bit integers (id 9).
    LongArray,
    /// IEEE-754 single-precision float (id 10).
    Float,
    /// IEEE-754 double-precision float (id 11).
    Double,
    /// Array of single-precision floats (id 12).
    FloatArray,
    /// Array of double-precision floats (id 13).
    DoubleArray,
    /// UTF-8 string (id 14).
    String,
    /// Nested message (id 15).
    SubMessage,
    /// Byte array of exactly 4 bytes, no length prefix (id 17).
    ByteArray4,
    /// Byte array of exactly 8 bytes (id 18).
    ByteArray8,
    /// Byte array of exactly 16 bytes (id 19).
    ByteArray16,
    /// Byte array of exactly 20 bytes (id 20).
    ByteArray20,
    /// Byte array of exactly 32 bytes (id 21).
    ByteArray32,
    /// Byte array of exactly 64 bytes (id 22).
    ByteArray64,
    /// Byte array of exactly 128 bytes (id 23).
    ByteArray128,
    /// Byte array of exactly 256 bytes (id 24).
    ByteArray256,
    /// Byte array of exactly 512 bytes (id 25).
    ByteArray512,
    /// Calendar date, 4 bytes (id 26).
    Date,
    /// Time of day with optional timezone, 8 bytes (id 27).
    Time,
    /// Combined date and time, 12 bytes (id 28).
    DateTime,
    /// A type id outside the built-in set.
    ///
    /// Values of such types round-trip as raw bytes. `fixed_size` is
    /// `None` for variable-width registrations.
    Other {
        /// The raw type id.
        type_id: u8,
        /// The fixed width in bytes, or `None` if variable-width.
        fixed_size: Option<u32>,
    },
}

impl WireType {
    /// Returns the one-byte type id for this wire type.
    #[must_use]
    pub const fn type_id(self) -> u8 {
        match self {
            Self::Indicator => 0,
            Self::Boolean => 1,
            Self::Byte => 2,
            Self::Short => 3,
            Self::Int => 4,
            Self::Long => 5,
            Self::ByteArray => 6,
            Self::ShortArray => 7,
            Self::IntArray => 8,
            Self::LongArray => 9,
            Self::Float => 10,
            Self::Double => 11,
            Self::FloatArray => 12,
            Self::DoubleArray => 13,
            Self::String => 14,
            Self::SubMessage => 15,
            Self::ByteArray4 => 17,
            Self::ByteArray8 => 18,
            Self::ByteArray16 => 19,
            Self::ByteArray20 => 20,
            Self::ByteArray32 => 21,
            Self::ByteArray64 => 22,
            Self::ByteArray128 => 23,
            Self::ByteArray256 => 24,
            Self::ByteArray512 => 25,
            Self::Date => 26,
            Self::Time => 27,
            Self::DateTime => 28,
            Self::Other { type_id, .. } => type_id,
        }
    }

    /// Looks up a built-in wire type by id.
    ///
    /// # Arguments
    /// * `type_id` - The one-byte type id
    ///
    /// # Returns
    /// The built-in type, or `None` for unassigned ids. Ids registered at
    /// context construction are resolved by the type dictionary instead.
    #[must_use]
    pub const fn from_id(type_id: u8) -> Option<Self> {
        Some(match type_id {
            0 => Self::Indicator,
            1 => Self::Boolean,
            2 => Self::Byte,
            3 => Self::Short,
            4 => Self::Int,
            5 => Self::Long,
            6 => Self::ByteArray,
            7 => Self::ShortArray,
            8 => Self::IntArray,
            9 => Self::LongArray,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::FloatArray,
            13 => Self::DoubleArray,
            14 => Self::String,
            15 => Self::SubMessage,
            17 => Self::ByteArray4,
            18 => Self::ByteArray8,
            19 => Self::ByteArray16,
            20 => Self::ByteArray20,
            21 => Self::ByteArray32,
            22 => Self::ByteArray64,
            23 => Self::ByteArray128,
            24 => Self::ByteArray256,
            25 => Self::ByteArray512,
            26 => Self::Date,
            27 => Self::Time,
            28 => Self::DateTime,
            _ => return None,
        })
    }

    /// Returns the fixed width in bytes, or `None` for variable-width types.
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Indicator => Some(0),
            Self::Boolean | Self::Byte => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Float | Self::Date | Self::ByteArray4 => Some(4),
            Self::Long | Self::Double | Self::Time | Self::ByteArray8 => Some(8),
            Self::DateTime => Some(12),
            Self::ByteArray16 => Some(16),
            Self::ByteArray20 => Some(20),
            Self::ByteArray32 => Some(32),
            Self::ByteArray64 => Some(64),
            Self::ByteArray128 => Some(128),
            Self::ByteArray256 => Some(256),
            Self::ByteArray512 => Some(512),
            Self::ByteArray
            | Self::ShortArray
            | Self::IntArray
            | Self::LongArray
            | Self::FloatArray
            | Self::DoubleArray
            | Self::String
            | Self::SubMessage => None,
            Self::Other { fixed_size, .. } => match fixed_size {
                Some(size) => Some(size as usize),
                None => None,
            },
        }
    }

    /// Returns true if values of this type carry a length prefix.
    #[must_use]
    pub const fn is_variable(self) -> bool {
        self.fixed_size().is_none()
    }

    /// Returns the fixed-width byte-array type matching a length exactly.
    ///
    /// The canonical lengths 4, 8, 16, 20, 32, 64, 128, 256 and 512 map to
    /// dedicated type ids that omit the length prefix on the wire.
    #[must_use]
    pub const fn canonical_byte_array(length: usize) -> Option<Self> {
        Some(match length {
            4 => Self::ByteArray4,
            8 => Self::ByteArray8,
            16 => Self::ByteArray16,
            20 => Self::ByteArray20,
            32 => Self::ByteArray32,
            64 => Self::ByteArray64,
            128 => Self::ByteArray128,
            256 => Self::ByteArray256,
            512 => Self::ByteArray512,
            _ => return None,
        })
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other { type_id, .. } => write!(f, "type-{}", type_id),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Accuracy marker for time and datetime values.
///
/// The precision occupies four bits of the time wire representation and
/// states how much of the value is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Precision {
    /// Accurate to the millennium.
    Millennium = 0,
    /// Accurate to the century.
    Century = 1,
    /// Accurate to the year.
    Year = 2,
    /// Accurate to the month.
    Month = 3,
    /// Accurate to the day.
    Day = 4,
    /// Accurate to the hour.
    Hour = 5,
    /// Accurate to the minute.
    Minute = 6,
    /// Accurate to the second.
    Second = 7,
    /// Accurate to the millisecond.
    Millisecond = 8,
    /// Accurate to the microsecond.
    Microsecond = 9,
    /// Accurate to the nanosecond.
    Nanosecond = 10,
}

impl Precision {
    /// Returns the four-bit wire code for this precision.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a precision by wire code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Millennium,
            1 => Self::Century,
            2 => Self::Year,
            3 => Self::Month,
            4 => Self::Day,
            5 => Self::Hour,
            6 => Self::Minute,
            7 => Self::Second,
            8 => Self::Millisecond,
            9 => Self::Microsecond,
            10 => Self::Nanosecond,
            _ => return None,
        })
    }
}

/// A calendar date as carried on the wire.
///
/// Encoded in four bytes as `(year << 9) | (month << 5) | day` with the
/// year two's-complement in the top 23 bits. A month or day of zero means
/// "not specified", so a year-only date is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FudgeDate {
    year: i32,
    month: u8,
    day: u8,
}

impl FudgeDate {
    /// Creates a date from its components.
    ///
    /// # Arguments
    /// * `year` - The year, valid within the signed 23-bit wire range
    /// * `month` - The month 1-12, or 0 for unspecified
    /// * `day` - The day 1-31, or 0 for unspecified
    ///
    /// # Returns
    /// `None` if a component is outside its wire range.
    #[must_use]
    pub const fn new(year: i32, month: u8, day: u8) -> Option<Self> {
        if year < -(1 << 22) || year >= (1 << 22) || month > 12 || day > 31 {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Reconstructs a date from the packed 32-bit wire word.
    #[must_use]
    pub const fn from_packed(word: i32) -> Self {
        Self {
            year: word >> 9,
            month: ((word >> 5) & 15) as u8,
            day: (word & 31) as u8,
        }
    }

    /// Returns the packed 32-bit wire word.
    #[must_use]
    pub const fn packed(self) -> i32 {
        (self.year << 9) | (((self.month & 15) as i32) << 5) | ((self.day & 31) as i32)
    }

    /// Returns the year.
    #[inline]
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Returns the month, 0 if unspecified.
    #[inline]
    #[must_use]
    pub const fn month(self) -> u8 {
        self.month
    }

    /// Returns the day of month, 0 if unspecified.
    #[inline]
    #[must_use]
    pub const fn day(self) -> u8 {
        self.day
    }

    /// Converts to a chrono date.
    ///
    /// # Returns
    /// `None` if the month or day is unspecified or does not name a real
    /// calendar day.
    #[must_use]
    pub fn to_naive_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month as u32, self.day as u32)
    }
}

impl From<NaiveDate> for FudgeDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
            day: date.day() as u8,
        }
    }
}

impl fmt::Display for FudgeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A time of day as carried on the wire.
///
/// Encoded in eight bytes: the first word packs the timezone offset, the
/// precision code and the seconds since midnight; the second word holds
/// the nanoseconds within the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FudgeTime {
    precision: Precision,
    timezone_offset: Option<i8>,
    seconds: u32,
    nanos: u32,
}

/// Wire marker for "no timezone" in the offset byte.
const NO_TIMEZONE: i8 = -128;

impl FudgeTime {
    /// Creates a time without a timezone.
    ///
    /// # Arguments
    /// * `precision` - How much of the value is meaningful
    /// * `seconds` - Seconds since midnight, at most 86399
    /// * `nanos` - Nanoseconds within the second, below 1_000_000_000
    ///
    /// # Returns
    /// `None` if a component is out of range.
    #[must_use]
    pub const fn new(precision: Precision, seconds: u32, nanos: u32) -> Option<Self> {
        if seconds >= 86_400 || nanos >= 1_000_000_000 {
            return None;
        }
        Some(Self {
            precision,
            timezone_offset: None,
            seconds,
            nanos,
        })
    }

    /// Attaches a timezone offset, counted in 15-minute intervals.
    #[must_use]
    pub const fn with_timezone(mut self, offset: i8) -> Self {
        self.timezone_offset = Some(offset);
        self
    }

    /// Reconstructs a time from the two packed 32-bit wire words.
    ///
    /// # Returns
    /// `None` if the precision code is unassigned.
    #[must_use]
    pub fn from_packed(first: u32, second: u32) -> Option<Self> {
        let raw_offset = (first >> 24) as u8 as i8;
        let precision = Precision::from_code(((first >> 20) & 15) as u8)?;
        Some(Self {
            precision,
            timezone_offset: if raw_offset == NO_TIMEZONE {
                None
            } else {
                Some(raw_offset)
            },
            seconds: first & 0x1_FFFF,
            nanos: second & 0x3FFF_FFFF,
        })
    }

    /// Returns the two packed 32-bit wire words.
    #[must_use]
    pub fn packed(self) -> (u32, u32) {
        let offset = self.timezone_offset.unwrap_or(NO_TIMEZONE) as u8;
        let first =
            ((offset as u32) << 24) | ((self.precision.code() as u32) << 20) | (self.seconds & 0x1_FFFF);
        (first, self.nanos & 0x3FFF_FFFF)
    }

    /// Returns the precision marker.
    #[inline]
    #[must_use]
    pub const fn precision(self) -> Precision {
        self.precision
    }

    /// Returns the timezone offset in 15-minute intervals, if present.
    #[inline]
    #[must_use]
    pub const fn timezone_offset(self) -> Option<i8> {
        self.timezone_offset
    }

    /// Returns the seconds since midnight.
    #[inline]
    #[must_use]
    pub const fn seconds(self) -> u32 {
        self.seconds
    }

    /// Returns the nanoseconds within the second.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u32 {
        self.nanos
    }

    /// Converts to a chrono time, discarding any timezone offset.
    #[must_use]
    pub fn to_naive_time(self) -> Option<NaiveTime> {
        NaiveTime::from_num_seconds_from_midnight_opt(self.seconds, self.nanos)
    }
}

impl From<NaiveTime> for FudgeTime {
    fn from(time: NaiveTime) -> Self {
        Self {
            precision: Precision::Nanosecond,
            timezone_offset: None,
            seconds: time.num_seconds_from_midnight(),
            nanos: time.nanosecond().min(999_999_999),
        }
    }
}

impl fmt::Display for FudgeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:09}",
            self.seconds / 3600,
            (self.seconds / 60) % 60,
            self.seconds % 60,
            self.nanos
        )
    }
}

/// A combined date and time as carried on the wire, 12 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FudgeDateTime {
    /// The date component.
    pub date: FudgeDate,
    /// The time component.
    pub time: FudgeTime,
}

impl FudgeDateTime {
    /// Creates a datetime from its components.
    #[must_use]
    pub const fn new(date: FudgeDate, time: FudgeTime) -> Self {
        Self { date, time }
    }

    /// Converts to a chrono datetime, discarding any timezone offset.
    #[must_use]
    pub fn to_naive_date_time(self) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::new(
            self.date.to_naive_date()?,
            self.time.to_naive_time()?,
        ))
    }
}

impl From<NaiveDateTime> for FudgeDateTime {
    fn from(datetime: NaiveDateTime) -> Self {
        Self {
            date: datetime.date().into(),
            time: datetime.time().into(),
        }
    }
}

impl fmt::Display for FudgeDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_id_roundtrip() {
        for id in 0u8..=28 {
            if let Some(ty) = WireType::from_id(id) {
                assert_eq!(ty.type_id(), id);
            }
        }
        assert_eq!(WireType::from_id(16), None);
        assert_eq!(WireType::from_id(200), None);
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(WireType::Indicator.fixed_size(), Some(0));
        assert_eq!(WireType::Boolean.fixed_size(), Some(1));
        assert_eq!(WireType::Long.fixed_size(), Some(8));
        assert_eq!(WireType::DateTime.fixed_size(), Some(12));
        assert_eq!(WireType::ByteArray512.fixed_size(), Some(512));
        assert!(WireType::String.is_variable());
        assert!(WireType::SubMessage.is_variable());
        assert!(WireType::ByteArray.is_variable());
    }

    #[test]
    fn test_canonical_byte_array() {
        assert_eq!(
            WireType::canonical_byte_array(20),
            Some(WireType::ByteArray20)
        );
        assert_eq!(WireType::canonical_byte_array(5), None);
        assert_eq!(WireType::canonical_byte_array(0), None);
    }

    #[test]
    fn test_date_packing() {
        let date = FudgeDate::new(2024, 3, 15).unwrap();
        let unpacked = FudgeDate::from_packed(date.packed());
        assert_eq!(unpacked, date);
        assert_eq!(unpacked.year(), 2024);
        assert_eq!(unpacked.month(), 3);
        assert_eq!(unpacked.day(), 15);
    }

    #[test]
    fn test_date_negative_year() {
        let date = FudgeDate::new(-44, 3, 15).unwrap();
        let unpacked = FudgeDate::from_packed(date.packed());
        assert_eq!(unpacked.year(), -44);
    }

    #[test]
    fn test_date_unspecified_components() {
        let date = FudgeDate::new(2024, 0, 0).unwrap();
        assert_eq!(date.to_naive_date(), None);
        let roundtrip = FudgeDate::from_packed(date.packed());
        assert_eq!(roundtrip.month(), 0);
        assert_eq!(roundtrip.day(), 0);
    }

    #[test]
    fn test_date_out_of_range() {
        assert!(FudgeDate::new(1 << 22, 1, 1).is_none());
        assert!(FudgeDate::new(2024, 13, 1).is_none());
        assert!(FudgeDate::new(2024, 1, 32).is_none());
    }

    #[test]
    fn test_time_packing() {
        let time = FudgeTime::new(Precision::Nanosecond, 45_296, 123_456_789)
            .unwrap()
            .with_timezone(-20);
        let (first, second) = time.packed();
        let unpacked = FudgeTime::from_packed(first, second).unwrap();
        assert_eq!(unpacked, time);
        assert_eq!(unpacked.timezone_offset(), Some(-20));
    }

    #[test]
    fn test_time_no_timezone() {
        let time = FudgeTime::new(Precision::Second, 60, 0).unwrap();
        let (first, second) = time.packed();
        let unpacked = FudgeTime::from_packed(first, second).unwrap();
        assert_eq!(unpacked.timezone_offset(), None);
        assert_eq!(unpacked.precision(), Precision::Second);
    }

    #[test]
    fn test_time_out_of_range() {
        assert!(FudgeTime::new(Precision::Second, 86_400, 0).is_none());
        assert!(FudgeTime::new(Precision::Nanosecond, 0, 1_000_000_000).is_none());
    }

    #[test]
    fn test_chrono_conversions() {
        let naive = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let date = FudgeDate::from(naive);
        assert_eq!(date.to_naive_date(), Some(naive));

        let naive_time = NaiveTime::from_hms_nano_opt(12, 34, 56, 789).unwrap();
        let time = FudgeTime::from(naive_time);
        assert_eq!(time.to_naive_time(), Some(naive_time));

        let naive_dt = NaiveDateTime::new(naive, naive_time);
        let datetime = FudgeDateTime::from(naive_dt);
        assert_eq!(datetime.to_naive_date_time(), Some(naive_dt));
    }

    #[test]
    fn test_precision_codes() {
        assert_eq!(Precision::Nanosecond.code(), 10);
        assert_eq!(Precision::from_code(4), Some(Precision::Day));
        assert_eq!(Precision::from_code(11), None);
    }
}
