//! Bit unpacking.
//!
//! Values are packed starting from the least significant bit of each byte.
use colchunk_error::{ColchunkError, ErrorKind, Result};

/// Number of bytes holding `count` values of `num_bits` each.
pub const fn packed_len(count: usize, num_bits: u8) -> usize {
    count.saturating_mul(num_bits as usize).div_ceil(8)
}

/// Unpack `count` values of `num_bits` bits each from `input`, appending them
/// to `out`.
pub fn unpack(input: &[u8], num_bits: u8, count: usize, out: &mut Vec<u64>) -> Result<()> {
    if num_bits > 64 {
        return Err(ColchunkError::with_kind(
            ErrorKind::InvalidData,
            format!("Invalid bit width: {num_bits}"),
        ));
    }

    if num_bits == 0 {
        out.extend(std::iter::repeat(0).take(count));
        return Ok(());
    }

    let needed = packed_len(count, num_bits);
    if input.len() < needed {
        return Err(ColchunkError::with_kind(
            ErrorKind::InvalidData,
            format!(
                "Bit packed buffer too small, expected at least {needed}, got {}",
                input.len()
            ),
        ));
    }

    out.reserve(count);

    let mask: u128 = (1u128 << num_bits) - 1;
    let mut acc: u128 = 0;
    let mut acc_bits: u32 = 0;
    let mut bytes = input.iter();

    for _ in 0..count {
        while acc_bits < num_bits as u32 {
            // Length checked above.
            let byte = match bytes.next() {
                Some(b) => *b,
                None => break,
            };
            acc |= (byte as u128) << acc_bits;
            acc_bits += 8;
        }

        out.push((acc & mask) as u64);
        acc >>= num_bits;
        acc_bits -= num_bits as u32;
    }

    Ok(())
}

/// Pack values into `out` using `num_bits` per value.
#[cfg(any(test, feature = "testutil"))]
pub fn pack(values: &[u64], num_bits: u8, out: &mut Vec<u8>) {
    let mut acc: u128 = 0;
    let mut acc_bits: u32 = 0;

    for &v in values {
        acc |= (v as u128) << acc_bits;
        acc_bits += num_bits as u32;
        while acc_bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            acc_bits -= 8;
        }
    }

    if acc_bits > 0 {
        out.push(acc as u8);
    }
}
