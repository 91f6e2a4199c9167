/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field types for Fudge messages.
//!
//! This module provides:
//! - [`Field`]: An immutable (type, value, name?, ordinal?) tuple
//! - [`FieldValue`]: Tagged variant over every built-in wire value
//! - [`FromFieldValue`]: Typed access with the primary conversion rules

use crate::message::{MsgValue, MutableMsg};
use crate::types::{FudgeDate, FudgeDateTime, FudgeTime, WireType};
use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// A Fudge field value.
///
/// One variant per built-in wire type, plus [`FieldValue::Unknown`] for
/// payloads of type ids outside the registered set. The indicator is a
/// zero-sized variant: its presence is the datum.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Presence-only marker with no payload.
    Indicator,
    /// Boolean value.
    Boolean(bool),
    /// Signed 8-bit integer.
    Byte(i8),
    /// Signed 16-bit integer.
    Short(i16),
    /// Signed 32-bit integer.
    Int(i32),
    /// Signed 64-bit integer.
    Long(i64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// Byte array; canonical lengths encode without a length prefix.
    ByteArray(Bytes),
    /// Array of signed 16-bit integers.
    ShortArray(Vec<i16>),
    /// Array of signed 32-bit integers.
    IntArray(Vec<i32>),
    /// Array of signed 64-bit integers.
    LongArray(Vec<i64>),
    /// Array of single-precision floats.
    FloatArray(Vec<f32>),
    /// Array of double-precision floats.
    DoubleArray(Vec<f64>),
    /// UTF-8 string.
    String(String),
    /// Nested message.
    Message(MsgValue),
    /// Calendar date.
    Date(FudgeDate),
    /// Time of day.
    Time(FudgeTime),
    /// Combined date and time.
    DateTime(FudgeDateTime),
    /// Raw payload of an unrecognised variable-width type id.
    Unknown {
        /// The type id as read from the wire.
        type_id: u8,
        /// The raw value bytes.
        data: Bytes,
    },
}

impl FieldValue {
    /// Returns a short name for the kind of this value, used in errors.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Indicator => "indicator",
            Self::Boolean(_) => "boolean",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::ByteArray(_) => "byte array",
            Self::ShortArray(_) => "short array",
            Self::IntArray(_) => "int array",
            Self::LongArray(_) => "long array",
            Self::FloatArray(_) => "float array",
            Self::DoubleArray(_) => "double array",
            Self::String(_) => "string",
            Self::Message(_) => "message",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// Returns the wire type this value encodes as by default.
    ///
    /// Byte arrays of a canonical length map to the corresponding
    /// fixed-width type id; unknown payloads keep the id they were read
    /// with. An explicit type can always be supplied instead when adding
    /// the field.
    #[must_use]
    pub fn default_wire_type(&self) -> WireType {
        match self {
            Self::Indicator => WireType::Indicator,
            Self::Boolean(_) => WireType::Boolean,
            Self::Byte(_) => WireType::Byte,
            Self::Short(_) => WireType::Short,
            Self::Int(_) => WireType::Int,
            Self::Long(_) => WireType::Long,
            Self::Float(_) => WireType::Float,
            Self::Double(_) => WireType::Double,
            Self::ByteArray(data) => {
                WireType::canonical_byte_array(data.len()).unwrap_or(WireType::ByteArray)
            }
            Self::ShortArray(_) => WireType::ShortArray,
            Self::IntArray(_) => WireType::IntArray,
            Self::LongArray(_) => WireType::LongArray,
            Self::FloatArray(_) => WireType::FloatArray,
            Self::DoubleArray(_) => WireType::DoubleArray,
            Self::String(_) => WireType::String,
            Self::Message(_) => WireType::SubMessage,
            Self::Date(_) => WireType::Date,
            Self::Time(_) => WireType::Time,
            Self::DateTime(_) => WireType::DateTime,
            Self::Unknown { type_id, .. } => WireType::Other {
                type_id: *type_id,
                fixed_size: None,
            },
        }
    }

    /// Returns the nested message, if this is a message value.
    #[must_use]
    pub const fn as_message(&self) -> Option<&MsgValue> {
        match self {
            Self::Message(msg) => Some(msg),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indicator => f.write_str("<indicator>"),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Short(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::ByteArray(data) => write!(f, "<{} bytes>", data.len()),
            Self::ShortArray(v) => write!(f, "<{} shorts>", v.len()),
            Self::IntArray(v) => write!(f, "<{} ints>", v.len()),
            Self::LongArray(v) => write!(f, "<{} longs>", v.len()),
            Self::FloatArray(v) => write!(f, "<{} floats>", v.len()),
            Self::DoubleArray(v) => write!(f, "<{} doubles>", v.len()),
            Self::String(s) => write!(f, "{}", s),
            Self::Message(_) => f.write_str("<message>"),
            Self::Date(d) => write!(f, "{}", d),
            Self::Time(t) => write!(f, "{}", t),
            Self::DateTime(dt) => write!(f, "{}", dt),
            Self::Unknown { type_id, data } => {
                write!(f, "<{} bytes of type {}>", data.len(), type_id)
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i8> for FieldValue {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for FieldValue {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Bytes> for FieldValue {
    fn from(v: Bytes) -> Self {
        Self::ByteArray(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        Self::ByteArray(Bytes::from(v))
    }
}

impl From<Vec<i16>> for FieldValue {
    fn from(v: Vec<i16>) -> Self {
        Self::ShortArray(v)
    }
}

impl From<Vec<i32>> for FieldValue {
    fn from(v: Vec<i32>) -> Self {
        Self::IntArray(v)
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(v: Vec<i64>) -> Self {
        Self::LongArray(v)
    }
}

impl From<Vec<f32>> for FieldValue {
    fn from(v: Vec<f32>) -> Self {
        Self::FloatArray(v)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        Self::DoubleArray(v)
    }
}

impl From<FudgeDate> for FieldValue {
    fn from(v: FudgeDate) -> Self {
        Self::Date(v)
    }
}

impl From<FudgeTime> for FieldValue {
    fn from(v: FudgeTime) -> Self {
        Self::Time(v)
    }
}

impl From<FudgeDateTime> for FieldValue {
    fn from(v: FudgeDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<chrono::NaiveDate> for FieldValue {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v.into())
    }
}

impl From<chrono::NaiveTime> for FieldValue {
    fn from(v: chrono::NaiveTime) -> Self {
        Self::Time(v.into())
    }
}

impl From<chrono::NaiveDateTime> for FieldValue {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::DateTime(v.into())
    }
}

impl From<MutableMsg> for FieldValue {
    fn from(v: MutableMsg) -> Self {
        Self::Message(MsgValue::Mutable(v))
    }
}

impl From<MsgValue> for FieldValue {
    fn from(v: MsgValue) -> Self {
        Self::Message(v)
    }
}

/// Typed access to a field value using the primary conversion rules.
///
/// Integer conversions widen freely and narrow only when the value fits;
/// floats accept any numeric; strings render numerics, booleans and
/// calendar values. Secondary types are converted through the type
/// dictionary instead of this trait.
pub trait FromFieldValue: Sized {
    /// Extracts a value of this type, or `None` if no primary conversion
    /// applies.
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl FromFieldValue for bool {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromFieldValue for i8 {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Byte(v) => Some(*v),
            FieldValue::Short(v) => Self::try_from(*v).ok(),
            FieldValue::Int(v) => Self::try_from(*v).ok(),
            FieldValue::Long(v) => Self::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromFieldValue for i16 {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Byte(v) => Some(*v as i16),
            FieldValue::Short(v) => Some(*v),
            FieldValue::Int(v) => Self::try_from(*v).ok(),
            FieldValue::Long(v) => Self::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromFieldValue for i32 {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Byte(v) => Some(*v as i32),
            FieldValue::Short(v) => Some(*v as i32),
            FieldValue::Int(v) => Some(*v),
            FieldValue::Long(v) => Self::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromFieldValue for i64 {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Byte(v) => Some(*v as i64),
            FieldValue::Short(v) => Some(*v as i64),
            FieldValue::Int(v) => Some(*v as i64),
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromFieldValue for f32 {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Double(v) => Some(*v as f32),
            FieldValue::Byte(v) => Some(*v as f32),
            FieldValue::Short(v) => Some(*v as f32),
            FieldValue::Int(v) => Some(*v as f32),
            FieldValue::Long(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl FromFieldValue for f64 {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            FieldValue::Byte(v) => Some(*v as f64),
            FieldValue::Short(v) => Some(*v as f64),
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Boolean(_)
            | FieldValue::Byte(_)
            | FieldValue::Short(_)
            | FieldValue::Int(_)
            | FieldValue::Long(_)
            | FieldValue::Float(_)
            | FieldValue::Double(_)
            | FieldValue::Date(_)
            | FieldValue::Time(_)
            | FieldValue::DateTime(_) => Some(value.to_string()),
            _ => None,
        }
    }
}

impl FromFieldValue for Bytes {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::ByteArray(data) => Some(data.clone()),
            FieldValue::Unknown { data, .. } => Some(data.clone()),
            _ => None,
        }
    }
}

impl FromFieldValue for Vec<u8> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        Bytes::from_field_value(value).map(|b| b.to_vec())
    }
}

impl FromFieldValue for Vec<i16> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::ShortArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromFieldValue for Vec<i32> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::IntArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromFieldValue for Vec<i64> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::LongArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromFieldValue for Vec<f32> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::FloatArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromFieldValue for Vec<f64> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::DoubleArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromFieldValue for FudgeDate {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Date(d) => Some(*d),
            FieldValue::DateTime(dt) => Some(dt.date),
            _ => None,
        }
    }
}

impl FromFieldValue for FudgeTime {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Time(t) => Some(*t),
            FieldValue::DateTime(dt) => Some(dt.time),
            _ => None,
        }
    }
}

impl FromFieldValue for FudgeDateTime {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl FromFieldValue for NaiveDate {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Date(d) => d.to_naive_date(),
            FieldValue::DateTime(dt) => dt.date.to_naive_date(),
            _ => None,
        }
    }
}

impl FromFieldValue for NaiveTime {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Time(t) => t.to_naive_time(),
            FieldValue::DateTime(dt) => dt.time.to_naive_time(),
            _ => None,
        }
    }
}

impl FromFieldValue for NaiveDateTime {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::DateTime(dt) => dt.to_naive_date_time(),
            _ => None,
        }
    }
}

impl FromFieldValue for MsgValue {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Message(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

/// A single field within a Fudge message.
///
/// A field is an immutable tuple of wire type, value, and optional name
/// and ordinal identifiers. Either, both, or neither identifier may be
/// present; equality compares all four components.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    wire_type: WireType,
    value: FieldValue,
    name: Option<String>,
    ordinal: Option<i16>,
}

impl Field {
    /// Creates a field from its components.
    ///
    /// # Arguments
    /// * `wire_type` - The wire type the value encodes as
    /// * `value` - The field value
    /// * `name` - Optional field name
    /// * `ordinal` - Optional field ordinal
    #[must_use]
    pub fn new(
        wire_type: WireType,
        value: FieldValue,
        name: Option<String>,
        ordinal: Option<i16>,
    ) -> Self {
        Self {
            wire_type,
            value,
            name,
            ordinal,
        }
    }

    /// Creates an anonymous field with the value's default wire type.
    #[must_use]
    pub fn of(value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        Self {
            wire_type: value.default_wire_type(),
            value,
            name: None,
            ordinal: None,
        }
    }

    /// Returns the wire type.
    #[inline]
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Returns the value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Returns a mutable reference to the value.
    #[inline]
    pub fn value_mut(&mut self) -> &mut FieldValue {
        &mut self.value
    }

    /// Returns the field name, if present.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the field ordinal, if present.
    #[inline]
    #[must_use]
    pub const fn ordinal(&self) -> Option<i16> {
        self.ordinal
    }

    /// Consumes the field and returns its value.
    #[must_use]
    pub fn into_value(self) -> FieldValue {
        self.value
    }

    /// Extracts the value as `T` using the primary conversion rules.
    #[must_use]
    pub fn get<T: FromFieldValue>(&self) -> Option<T> {
        T::from_field_value(&self.value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.ordinal) {
            (Some(name), Some(ordinal)) => {
                write!(f, "{}[{}]: {}", name, ordinal, self.value)
            }
            (Some(name), None) => write!(f, "{}: {}", name, self.value),
            (None, Some(ordinal)) => write!(f, "[{}]: {}", ordinal, self.value),
            (None, None) => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wire_type() {
        assert_eq!(FieldValue::from(true).default_wire_type(), WireType::Boolean);
        assert_eq!(FieldValue::from(42i32).default_wire_type(), WireType::Int);
        assert_eq!(
            FieldValue::from("hello").default_wire_type(),
            WireType::String
        );
        assert_eq!(
            FieldValue::from(vec![0u8; 20]).default_wire_type(),
            WireType::ByteArray20
        );
        assert_eq!(
            FieldValue::from(vec![0u8; 5]).default_wire_type(),
            WireType::ByteArray
        );
    }

    #[test]
    fn test_field_equality() {
        let a = Field::new(
            WireType::Int,
            FieldValue::Int(7),
            Some("x".to_string()),
            Some(1),
        );
        let b = Field::new(
            WireType::Int,
            FieldValue::Int(7),
            Some("x".to_string()),
            Some(1),
        );
        let c = Field::new(WireType::Int, FieldValue::Int(7), None, Some(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_integer_widening() {
        let value = FieldValue::Byte(5);
        assert_eq!(i16::from_field_value(&value), Some(5));
        assert_eq!(i32::from_field_value(&value), Some(5));
        assert_eq!(i64::from_field_value(&value), Some(5));
        assert_eq!(f64::from_field_value(&value), Some(5.0));
    }

    #[test]
    fn test_integer_narrowing() {
        assert_eq!(i8::from_field_value(&FieldValue::Int(100)), Some(100));
        assert_eq!(i8::from_field_value(&FieldValue::Int(1000)), None);
        assert_eq!(i16::from_field_value(&FieldValue::Long(32_767)), Some(32_767));
        assert_eq!(i16::from_field_value(&FieldValue::Long(32_768)), None);
    }

    #[test]
    fn test_string_rendering() {
        assert_eq!(
            String::from_field_value(&FieldValue::Int(42)),
            Some("42".to_string())
        );
        assert_eq!(
            String::from_field_value(&FieldValue::Boolean(true)),
            Some("true".to_string())
        );
        assert_eq!(
            String::from_field_value(&FieldValue::ByteArray(Bytes::new())),
            None
        );
    }

    #[test]
    fn test_typed_getter_on_field() {
        let field = Field::of(123i32);
        assert_eq!(field.get::<i64>(), Some(123));
        assert_eq!(field.get::<bool>(), None);
    }

    #[test]
    fn test_indicator_has_no_payload_kind() {
        assert_eq!(FieldValue::Indicator.kind_name(), "indicator");
        assert_eq!(
            FieldValue::Indicator.default_wire_type(),
            WireType::Indicator
        );
    }
}
