//! ULEB128 things.
//!
//! Used for run headers in the RLE/bit-packed hybrid encoding and for the
//! block headers of delta encoding.
//!
//! <https://en.wikipedia.org/wiki/LEB128#Unsigned_LEB128>
use colchunk_error::{ColchunkError, ErrorKind, Result};

/// ULEB128 encode a u64, appending to `buf`.
///
/// Returns number of bytes written.
pub fn encode_uleb128(mut value: u64, buf: &mut Vec<u8>) -> usize {
    let start = buf.len();

    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80;
        }

        buf.push(byte);

        if value == 0 {
            break;
        }
    }

    buf.len() - start
}

/// Decodes as u64 from `buf`.
///
/// Returns (val, offset) pair.
pub fn decode_uleb128(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0;
    let mut consumed = 0;

    for &byte in buf {
        if shift >= 64 {
            return Err(ColchunkError::with_kind(
                ErrorKind::InvalidData,
                "ULEB128 value is too large",
            ));
        }

        let low_bits = (byte & 0x7F) as u64;
        value |= low_bits << shift;

        consumed += 1;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((value, consumed));
        }
    }

    Err(ColchunkError::with_kind(
        ErrorKind::InvalidData,
        "Invalid ULEB128 sequence",
    ))
}
