//! PLAIN decoding.
use colchunk_error::{ColchunkError, ErrorKind, Result};

use super::bitpack::{packed_len, unpack};
use crate::types::{Int96, ParquetFixedWidthType, PhysicalType};
use crate::value::Value;

/// Plain decode `num_values` values of `physical_type` from `buf`.
pub fn plain_decode_values(
    physical_type: PhysicalType,
    num_values: usize,
    buf: &[u8],
) -> Result<Vec<Value>> {
    Ok(match physical_type {
        PhysicalType::Boolean => plain_decode_boolean(num_values, buf)?
            .into_iter()
            .map(Value::Boolean)
            .collect(),
        PhysicalType::Int32 => plain_decode_primitive::<i32>(num_values, buf)?
            .into_iter()
            .map(Value::Int32)
            .collect(),
        PhysicalType::Int64 => plain_decode_primitive::<i64>(num_values, buf)?
            .into_iter()
            .map(Value::Int64)
            .collect(),
        PhysicalType::Int96 => plain_decode_primitive::<Int96>(num_values, buf)?
            .into_iter()
            .map(Value::Int96)
            .collect(),
        PhysicalType::Float => plain_decode_primitive::<f32>(num_values, buf)?
            .into_iter()
            .map(Value::Float)
            .collect(),
        PhysicalType::Double => plain_decode_primitive::<f64>(num_values, buf)?
            .into_iter()
            .map(Value::Double)
            .collect(),
        PhysicalType::ByteArray => plain_decode_binary(num_values, buf)?
            .into_iter()
            .map(Value::Bytes)
            .collect(),
        PhysicalType::FixedLenByteArray(len) => plain_decode_fixed_len(num_values, len, buf)?
            .into_iter()
            .map(Value::Bytes)
            .collect(),
    })
}

pub fn plain_decode_primitive<T>(num_values: usize, buf: &[u8]) -> Result<Vec<T>>
where
    T: ParquetFixedWidthType,
{
    let min_buf_len = num_values.saturating_mul(T::WIDTH);
    if buf.len() < min_buf_len {
        return Err(too_small(T::PHYSICAL_TYPE, min_buf_len, buf.len()));
    }

    Ok(buf[..min_buf_len]
        .chunks_exact(T::WIDTH)
        .map(T::from_le_slice)
        .collect())
}

/// Booleans are bit packed with a bit width of 1.
pub fn plain_decode_boolean(num_values: usize, buf: &[u8]) -> Result<Vec<bool>> {
    let min_buf_len = packed_len(num_values, 1);
    if buf.len() < min_buf_len {
        return Err(too_small(PhysicalType::Boolean, min_buf_len, buf.len()));
    }

    let mut bits = Vec::with_capacity(num_values);
    unpack(buf, 1, num_values, &mut bits)?;

    Ok(bits.into_iter().map(|b| b == 1).collect())
}

/// Byte arrays are each prefixed with a 4 byte little endian length.
pub fn plain_decode_binary(num_values: usize, buf: &[u8]) -> Result<Vec<Vec<u8>>> {
    let min_buf_len = num_values.saturating_mul(std::mem::size_of::<u32>());
    if buf.len() < min_buf_len {
        return Err(too_small(PhysicalType::ByteArray, min_buf_len, buf.len()));
    }

    let mut out = Vec::with_capacity(num_values);

    let mut buf_start = 0;
    for _ in 0..num_values {
        let len_bytes = buf.get(buf_start..buf_start + 4).ok_or_else(|| {
            ColchunkError::with_kind(ErrorKind::InvalidData, "Byte array length out of bounds")
        })?;
        let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])
            as usize;
        buf_start += 4;

        let val = buf.get(buf_start..buf_start + len).ok_or_else(|| {
            ColchunkError::with_kind(
                ErrorKind::InvalidData,
                format!("Byte array of length {len} at offset {buf_start} out of bounds"),
            )
        })?;
        buf_start += len;

        out.push(val.to_vec());
    }

    Ok(out)
}

pub fn plain_decode_fixed_len(
    num_values: usize,
    type_length: usize,
    buf: &[u8],
) -> Result<Vec<Vec<u8>>> {
    if type_length == 0 {
        return Err(ColchunkError::with_kind(
            ErrorKind::InvalidData,
            "Fixed length byte array with a length of zero",
        ));
    }

    let min_buf_len = num_values.saturating_mul(type_length);
    if buf.len() < min_buf_len {
        return Err(too_small(
            PhysicalType::FixedLenByteArray(type_length),
            min_buf_len,
            buf.len(),
        ));
    }

    Ok(buf[..min_buf_len]
        .chunks_exact(type_length)
        .map(|c| c.to_vec())
        .collect())
}

fn too_small(physical_type: PhysicalType, expected: usize, got: usize) -> ColchunkError {
    ColchunkError::with_kind(
        ErrorKind::InvalidData,
        format!("Buffer too small for {physical_type:?}, expected at least {expected}, got {got}"),
    )
}
