//! Convert primitive values to richer types using schema annotations.
use chrono::{DateTime, Days, NaiveDate, Utc};
use colchunk_error::{ColchunkError, ErrorKind, Result};

use crate::metadata::schema::SchemaElement;
use crate::types::{ConvertedType, LogicalType, PhysicalType, TimeUnit};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    None,
    String,
    Date,
    Timestamp(TimeUnit),
    Decimal { scale: i32 },
    Unsigned32,
    Unsigned64,
}

impl Conversion {
    fn for_element(element: &SchemaElement) -> Self {
        if element.physical_type == Some(PhysicalType::Int96) {
            return Conversion::Timestamp(TimeUnit::Nanos);
        }

        if let Some(logical) = element.logical_type {
            match logical {
                LogicalType::String | LogicalType::Enum | LogicalType::Json => {
                    return Conversion::String
                }
                LogicalType::Date => return Conversion::Date,
                LogicalType::Timestamp { unit, .. } => return Conversion::Timestamp(unit),
                LogicalType::Decimal { scale, .. } => return Conversion::Decimal { scale },
                LogicalType::Integer {
                    bit_width,
                    is_signed: false,
                } => {
                    return if bit_width == 64 {
                        Conversion::Unsigned64
                    } else {
                        Conversion::Unsigned32
                    }
                }
                _ => (),
            }
        }

        match element.converted_type {
            Some(ConvertedType::Utf8 | ConvertedType::Enum | ConvertedType::Json) => {
                Conversion::String
            }
            Some(ConvertedType::Date) => Conversion::Date,
            Some(ConvertedType::TimestampMillis) => Conversion::Timestamp(TimeUnit::Millis),
            Some(ConvertedType::TimestampMicros) => Conversion::Timestamp(TimeUnit::Micros),
            Some(ConvertedType::Decimal) => Conversion::Decimal {
                scale: element.scale.unwrap_or(0),
            },
            Some(ConvertedType::Uint8 | ConvertedType::Uint16 | ConvertedType::Uint32) => {
                Conversion::Unsigned32
            }
            Some(ConvertedType::Uint64) => Conversion::Unsigned64,
            _ => Conversion::None,
        }
    }
}

/// Convert values according to the converted or logical type of `element`.
///
/// Values that don't need conversion, nulls, and values that have already
/// been converted pass through unchanged.
pub fn convert(values: Vec<Value>, element: &SchemaElement) -> Result<Vec<Value>> {
    let conversion = Conversion::for_element(element);
    if conversion == Conversion::None {
        return Ok(values);
    }

    values
        .into_iter()
        .map(|v| convert_value(v, conversion))
        .collect()
}

fn convert_value(value: Value, conversion: Conversion) -> Result<Value> {
    Ok(match (conversion, value) {
        (Conversion::String, Value::Bytes(b)) => match String::from_utf8(b) {
            Ok(s) => Value::String(s),
            Err(e) => Value::String(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        },
        (Conversion::Date, Value::Int32(days)) => Value::Date(date_from_days(days)?),
        (Conversion::Timestamp(_), Value::Int96(v)) => {
            Value::Timestamp(timestamp(v.to_nanos(), TimeUnit::Nanos)?)
        }
        (Conversion::Timestamp(unit), Value::Int64(v)) => Value::Timestamp(timestamp(v, unit)?),
        (Conversion::Decimal { scale }, Value::Int32(v)) => Value::Decimal {
            unscaled: v as i128,
            scale,
        },
        (Conversion::Decimal { scale }, Value::Int64(v)) => Value::Decimal {
            unscaled: v as i128,
            scale,
        },
        (Conversion::Decimal { scale }, Value::Bytes(b)) => Value::Decimal {
            unscaled: decimal_from_be_bytes(&b)?,
            scale,
        },
        (Conversion::Unsigned32, Value::Int32(v)) => Value::Int64(v as u32 as i64),
        (Conversion::Unsigned64, Value::Int64(v)) => Value::UInt64(v as u64),
        (_, other) => other,
    })
}

fn date_from_days(days: i32) -> Result<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| ColchunkError::new("Failed to create unix epoch date"))?;
    let date = if days >= 0 {
        epoch.checked_add_days(Days::new(days as u64))
    } else {
        epoch.checked_sub_days(Days::new(days.unsigned_abs() as u64))
    };

    date.ok_or_else(|| {
        ColchunkError::with_kind(ErrorKind::InvalidData, format!("Date out of range: {days}"))
    })
}

fn timestamp(v: i64, unit: TimeUnit) -> Result<DateTime<Utc>> {
    let per_sec = match unit {
        TimeUnit::Millis => 1_000,
        TimeUnit::Micros => 1_000_000,
        TimeUnit::Nanos => 1_000_000_000,
    };
    let secs = v.div_euclid(per_sec);
    let nanos = v.rem_euclid(per_sec) * (1_000_000_000 / per_sec);

    DateTime::from_timestamp(secs, nanos as u32).ok_or_else(|| {
        ColchunkError::with_kind(
            ErrorKind::InvalidData,
            format!("Timestamp out of range: {v} ({unit:?})"),
        )
    })
}

/// Decode a big endian two's complement integer.
fn decimal_from_be_bytes(bytes: &[u8]) -> Result<i128> {
    if bytes.len() > 16 {
        return Err(ColchunkError::with_kind(
            ErrorKind::InvalidData,
            format!("Decimal of {} bytes does not fit in 128 bits", bytes.len()),
        ));
    }
    if bytes.is_empty() {
        return Ok(0);
    }

    let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0 };
    let mut buf = [fill; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);

    Ok(i128::from_be_bytes(buf))
}
