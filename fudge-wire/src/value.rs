/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Value payload codec.
//!
//! Reads and writes the payload bytes of every wire type except
//! sub-messages, which the stream reader and writer handle through their
//! frame machinery. All multi-byte integers are big-endian; floats are
//! IEEE-754.

use fudge_core::error::{DecodeError, EncodeError, Result};
use fudge_core::field::FieldValue;
use fudge_core::types::{FudgeDate, FudgeDateTime, FudgeTime, WireType};
use std::io::{Read, Write};

/// Reads exactly `buf.len()` bytes, mapping a short read to
/// [`DecodeError::UnexpectedEof`].
pub(crate) fn read_exact<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<()> {
    input.read_exact(buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            DecodeError::UnexpectedEof.into()
        } else {
            err.into()
        }
    })
}

macro_rules! read_be {
    ($fn_name:ident, $ty:ty, $bytes:expr) => {
        pub(crate) fn $fn_name<R: Read>(input: &mut R) -> Result<$ty> {
            let mut buf = [0u8; $bytes];
            read_exact(input, &mut buf)?;
            Ok(<$ty>::from_be_bytes(buf))
        }
    };
}

read_be!(read_u8, u8, 1);
read_be!(read_i8, i8, 1);
read_be!(read_i16, i16, 2);
read_be!(read_u16, u16, 2);
read_be!(read_i32, i32, 4);
read_be!(read_u32, u32, 4);
read_be!(read_i64, i64, 8);

pub(crate) fn read_f32<R: Read>(input: &mut R) -> Result<f32> {
    Ok(f32::from_bits(read_u32(input)?))
}

pub(crate) fn read_f64<R: Read>(input: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    read_exact(input, &mut buf)?;
    Ok(f64::from_be_bytes(buf))
}

fn read_bytes<R: Read>(input: &mut R, size: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; size];
    read_exact(input, &mut buf)?;
    Ok(buf)
}

/// Reads a value payload of the given type.
///
/// # Arguments
/// * `input` - The byte source, positioned at the first payload byte
/// * `wire_type` - The type the payload was declared with
/// * `size` - The payload size: the declared size for variable-width
///   types, the fixed width otherwise
///
/// Sub-message payloads are not read here; the stream reader descends
/// into them instead.
pub fn read_value<R: Read>(input: &mut R, wire_type: WireType, size: usize) -> Result<FieldValue> {
    Ok(match wire_type {
        WireType::Indicator => FieldValue::Indicator,
        WireType::Boolean => FieldValue::Boolean(read_u8(input)? != 0),
        WireType::Byte => FieldValue::Byte(read_i8(input)?),
        WireType::Short => FieldValue::Short(read_i16(input)?),
        WireType::Int => FieldValue::Int(read_i32(input)?),
        WireType::Long => FieldValue::Long(read_i64(input)?),
        WireType::Float => FieldValue::Float(read_f32(input)?),
        WireType::Double => FieldValue::Double(read_f64(input)?),
        WireType::ShortArray => {
            let buf = read_bytes(input, size)?;
            FieldValue::ShortArray(
                buf.chunks_exact(2)
                    .map(|chunk| i16::from_be_bytes([chunk[0], chunk[1]]))
                    .collect(),
            )
        }
        WireType::IntArray => {
            let buf = read_bytes(input, size)?;
            FieldValue::IntArray(
                buf.chunks_exact(4)
                    .map(|chunk| i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect(),
            )
        }
        WireType::LongArray => {
            let buf = read_bytes(input, size)?;
            FieldValue::LongArray(
                buf.chunks_exact(8)
                    .map(|chunk| {
                        i64::from_be_bytes([
                            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6],
                            chunk[7],
                        ])
                    })
                    .collect(),
            )
        }
        WireType::FloatArray => {
            let buf = read_bytes(input, size)?;
            FieldValue::FloatArray(
                buf.chunks_exact(4)
                    .map(|chunk| {
                        f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
                    })
                    .collect(),
            )
        }
        WireType::DoubleArray => {
            let buf = read_bytes(input, size)?;
            FieldValue::DoubleArray(
                buf.chunks_exact(8)
                    .map(|chunk| {
                        f64::from_be_bytes([
                            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6],
                            chunk[7],
                        ])
                    })
                    .collect(),
            )
        }
        WireType::ByteArray
        | WireType::ByteArray4
        | WireType::ByteArray8
        | WireType::ByteArray16
        | WireType::ByteArray20
        | WireType::ByteArray32
        | WireType::ByteArray64
        | WireType::ByteArray128
        | WireType::ByteArray256
        | WireType::ByteArray512 => FieldValue::ByteArray(read_bytes(input, size)?.into()),
        WireType::String => {
            FieldValue::String(String::from_utf8(read_bytes(input, size)?).map_err(|err| {
                DecodeError::InvalidFieldValue {
                    type_id: WireType::String.type_id(),
                    reason: err.to_string(),
                }
            })?)
        }
        WireType::Date => FieldValue::Date(FudgeDate::from_packed(read_i32(input)?)),
        WireType::Time => FieldValue::Time(read_time(input)?),
        WireType::DateTime => {
            let date = FudgeDate::from_packed(read_i32(input)?);
            let time = read_time(input)?;
            FieldValue::DateTime(FudgeDateTime::new(date, time))
        }
        WireType::SubMessage => {
            return Err(DecodeError::InvalidFieldValue {
                type_id: wire_type.type_id(),
                reason: "sub-messages are decoded through the stream reader".to_string(),
            }
            .into())
        }
        WireType::Other { type_id, .. } => FieldValue::Unknown {
            type_id,
            data: read_bytes(input, size)?.into(),
        },
    })
}

fn read_time<R: Read>(input: &mut R) -> Result<FudgeTime> {
    let first = read_u32(input)?;
    let second = read_u32(input)?;
    FudgeTime::from_packed(first, second).ok_or_else(|| {
        DecodeError::InvalidFieldValue {
            type_id: WireType::Time.type_id(),
            reason: format!("unassigned precision code {}", (first >> 20) & 15),
        }
        .into()
    })
}

/// Checks that a value can be written as the given wire type.
///
/// The stream writer runs this before emitting a field so that a
/// mismatch surfaces while the stream is still clean.
pub fn check_value(wire_type: WireType, value: &FieldValue) -> Result<()> {
    let compatible = match (wire_type, value) {
        (WireType::Indicator, FieldValue::Indicator)
        | (WireType::Boolean, FieldValue::Boolean(_))
        | (WireType::Byte, FieldValue::Byte(_))
        | (WireType::Short, FieldValue::Short(_))
        | (WireType::Int, FieldValue::Int(_))
        | (WireType::Long, FieldValue::Long(_))
        | (WireType::Float, FieldValue::Float(_))
        | (WireType::Double, FieldValue::Double(_))
        | (WireType::ByteArray, FieldValue::ByteArray(_))
        | (WireType::ShortArray, FieldValue::ShortArray(_))
        | (WireType::IntArray, FieldValue::IntArray(_))
        | (WireType::LongArray, FieldValue::LongArray(_))
        | (WireType::FloatArray, FieldValue::FloatArray(_))
        | (WireType::DoubleArray, FieldValue::DoubleArray(_))
        | (WireType::String, FieldValue::String(_))
        | (WireType::SubMessage, FieldValue::Message(_))
        | (WireType::Date, FieldValue::Date(_))
        | (WireType::Time, FieldValue::Time(_))
        | (WireType::DateTime, FieldValue::DateTime(_)) => true,
        (
            WireType::ByteArray4
            | WireType::ByteArray8
            | WireType::ByteArray16
            | WireType::ByteArray20
            | WireType::ByteArray32
            | WireType::ByteArray64
            | WireType::ByteArray128
            | WireType::ByteArray256
            | WireType::ByteArray512,
            FieldValue::ByteArray(data),
        ) => {
            let expected = wire_type.fixed_size().unwrap_or_default();
            if data.len() != expected {
                return Err(EncodeError::InvalidValue {
                    type_id: wire_type.type_id(),
                    reason: format!("byte array of {} bytes, type holds {}", data.len(), expected),
                }
                .into());
            }
            true
        }
        (WireType::Other { fixed_size, .. }, FieldValue::Unknown { data, .. }) => {
            if let Some(expected) = fixed_size {
                if data.len() != expected as usize {
                    return Err(EncodeError::InvalidValue {
                        type_id: wire_type.type_id(),
                        reason: format!(
                            "payload of {} bytes, type holds {}",
                            data.len(),
                            expected
                        ),
                    }
                    .into());
                }
            }
            true
        }
        _ => false,
    };
    if compatible {
        Ok(())
    } else {
        Err(EncodeError::InvalidValue {
            type_id: wire_type.type_id(),
            reason: format!("{} value", value.kind_name()),
        }
        .into())
    }
}

/// Writes a value payload of the given type.
///
/// The value must match the declared wire type; a mismatch is an
/// [`EncodeError::InvalidValue`] and nothing is written. Sub-message
/// payloads are not written here; the stream writer recurses instead.
pub fn write_value<W: Write>(out: &mut W, wire_type: WireType, value: &FieldValue) -> Result<()> {
    match (wire_type, value) {
        (WireType::Indicator, FieldValue::Indicator) => {}
        (WireType::Boolean, FieldValue::Boolean(v)) => out.write_all(&[u8::from(*v)])?,
        (WireType::Byte, FieldValue::Byte(v)) => out.write_all(&v.to_be_bytes())?,
        (WireType::Short, FieldValue::Short(v)) => out.write_all(&v.to_be_bytes())?,
        (WireType::Int, FieldValue::Int(v)) => out.write_all(&v.to_be_bytes())?,
        (WireType::Long, FieldValue::Long(v)) => out.write_all(&v.to_be_bytes())?,
        (WireType::Float, FieldValue::Float(v)) => out.write_all(&v.to_be_bytes())?,
        (WireType::Double, FieldValue::Double(v)) => out.write_all(&v.to_be_bytes())?,
        (WireType::ShortArray, FieldValue::ShortArray(values)) => {
            for v in values {
                out.write_all(&v.to_be_bytes())?;
            }
        }
        (WireType::IntArray, FieldValue::IntArray(values)) => {
            for v in values {
                out.write_all(&v.to_be_bytes())?;
            }
        }
        (WireType::LongArray, FieldValue::LongArray(values)) => {
            for v in values {
                out.write_all(&v.to_be_bytes())?;
            }
        }
        (WireType::FloatArray, FieldValue::FloatArray(values)) => {
            for v in values {
                out.write_all(&v.to_be_bytes())?;
            }
        }
        (WireType::DoubleArray, FieldValue::DoubleArray(values)) => {
            for v in values {
                out.write_all(&v.to_be_bytes())?;
            }
        }
        (
            WireType::ByteArray
            | WireType::ByteArray4
            | WireType::ByteArray8
            | WireType::ByteArray16
            | WireType::ByteArray20
            | WireType::ByteArray32
            | WireType::ByteArray64
            | WireType::ByteArray128
            | WireType::ByteArray256
            | WireType::ByteArray512,
            FieldValue::ByteArray(data),
        ) => {
            if let Some(fixed) = wire_type.fixed_size() {
                if data.len() != fixed {
                    return Err(EncodeError::InvalidValue {
                        type_id: wire_type.type_id(),
                        reason: format!("byte array of {} bytes, type holds {}", data.len(), fixed),
                    }
                    .into());
                }
            }
            out.write_all(data)?;
        }
        (WireType::String, FieldValue::String(s)) => out.write_all(s.as_bytes())?,
        (WireType::Date, FieldValue::Date(date)) => out.write_all(&date.packed().to_be_bytes())?,
        (WireType::Time, FieldValue::Time(time)) => write_time(out, *time)?,
        (WireType::DateTime, FieldValue::DateTime(datetime)) => {
            out.write_all(&datetime.date.packed().to_be_bytes())?;
            write_time(out, datetime.time)?;
        }
        (WireType::Other { fixed_size, .. }, FieldValue::Unknown { data, .. }) => {
            if let Some(fixed) = fixed_size {
                if data.len() != fixed as usize {
                    return Err(EncodeError::InvalidValue {
                        type_id: wire_type.type_id(),
                        reason: format!(
                            "payload of {} bytes, type holds {}",
                            data.len(),
                            fixed
                        ),
                    }
                    .into());
                }
            }
            out.write_all(data)?;
        }
        (wire_type, value) => {
            return Err(EncodeError::InvalidValue {
                type_id: wire_type.type_id(),
                reason: format!("{} value", value.kind_name()),
            }
            .into())
        }
    }
    Ok(())
}

fn write_time<W: Write>(out: &mut W, time: FudgeTime) -> Result<()> {
    let (first, second) = time.packed();
    out.write_all(&first.to_be_bytes())?;
    out.write_all(&second.to_be_bytes())?;
    Ok(())
}

/// Returns the payload size of a variable-width value, excluding
/// sub-messages, whose size depends on the taxonomy in use.
#[must_use]
pub fn variable_value_size(value: &FieldValue) -> usize {
    match value {
        FieldValue::ByteArray(data) => data.len(),
        FieldValue::ShortArray(values) => values.len() * 2,
        FieldValue::IntArray(values) => values.len() * 4,
        FieldValue::LongArray(values) => values.len() * 8,
        FieldValue::FloatArray(values) => values.len() * 4,
        FieldValue::DoubleArray(values) => values.len() * 8,
        FieldValue::String(s) => s.len(),
        FieldValue::Unknown { data, .. } => data.len(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(wire_type: WireType, value: FieldValue) -> FieldValue {
        let mut buf = Vec::new();
        write_value(&mut buf, wire_type, &value).unwrap();
        if let Some(fixed) = wire_type.fixed_size() {
            assert_eq!(buf.len(), fixed);
        } else {
            assert_eq!(buf.len(), variable_value_size(&value));
        }
        read_value(&mut Cursor::new(&buf), wire_type, buf.len()).unwrap()
    }

    #[test]
    fn test_primitive_roundtrips() {
        assert_eq!(
            roundtrip(WireType::Boolean, FieldValue::Boolean(true)),
            FieldValue::Boolean(true)
        );
        assert_eq!(
            roundtrip(WireType::Int, FieldValue::Int(-123_456)),
            FieldValue::Int(-123_456)
        );
        assert_eq!(
            roundtrip(WireType::Long, FieldValue::Long(i64::MIN)),
            FieldValue::Long(i64::MIN)
        );
        assert_eq!(
            roundtrip(WireType::Double, FieldValue::Double(std::f64::consts::PI)),
            FieldValue::Double(std::f64::consts::PI)
        );
    }

    #[test]
    fn test_big_endian_layout() {
        let mut buf = Vec::new();
        write_value(&mut buf, WireType::Int, &FieldValue::Int(0x0102_0304)).unwrap();
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_array_roundtrips() {
        assert_eq!(
            roundtrip(
                WireType::IntArray,
                FieldValue::IntArray(vec![1, -2, 3_000_000])
            ),
            FieldValue::IntArray(vec![1, -2, 3_000_000])
        );
        assert_eq!(
            roundtrip(
                WireType::DoubleArray,
                FieldValue::DoubleArray(vec![0.5, -1.25])
            ),
            FieldValue::DoubleArray(vec![0.5, -1.25])
        );
    }

    #[test]
    fn test_string_roundtrip() {
        let value = FieldValue::String("héllo wörld".to_string());
        assert_eq!(roundtrip(WireType::String, value.clone()), value);
    }

    #[test]
    fn test_fixed_byte_array_rejects_wrong_length() {
        let err = write_value(
            &mut Vec::new(),
            WireType::ByteArray4,
            &FieldValue::ByteArray(vec![1, 2, 3].into()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::Encode(EncodeError::InvalidValue { type_id: 17, .. })
        ));
    }

    #[test]
    fn test_type_value_mismatch() {
        let err = write_value(&mut Vec::new(), WireType::Int, &FieldValue::Boolean(true))
            .unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::Encode(EncodeError::InvalidValue { type_id: 4, .. })
        ));
    }

    #[test]
    fn test_date_time_roundtrips() {
        let date = FudgeDate::new(1999, 12, 31).unwrap();
        assert_eq!(
            roundtrip(WireType::Date, FieldValue::Date(date)),
            FieldValue::Date(date)
        );

        let time = FudgeTime::new(fudge_core::Precision::Nanosecond, 3_600, 42)
            .unwrap()
            .with_timezone(4);
        assert_eq!(
            roundtrip(WireType::Time, FieldValue::Time(time)),
            FieldValue::Time(time)
        );

        let datetime = FudgeDateTime::new(date, time);
        assert_eq!(
            roundtrip(WireType::DateTime, FieldValue::DateTime(datetime)),
            FieldValue::DateTime(datetime)
        );
    }

    #[test]
    fn test_unknown_payload_roundtrip() {
        let value = FieldValue::Unknown {
            type_id: 100,
            data: vec![9, 8, 7].into(),
        };
        let wire_type = WireType::Other {
            type_id: 100,
            fixed_size: None,
        };
        assert_eq!(roundtrip(wire_type, value.clone()), value);
    }

    #[test]
    fn test_truncated_read() {
        let err = read_value(&mut Cursor::new(&[0u8; 2]), WireType::Int, 4).unwrap_err();
        assert!(matches!(
            err,
            fudge_core::FudgeError::Decode(DecodeError::UnexpectedEof)
        ));
    }
}
