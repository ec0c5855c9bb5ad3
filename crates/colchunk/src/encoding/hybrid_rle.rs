//! RLE/bit-packed hybrid decoding.
//!
//! See <https://github.com/apache/parquet-format/blob/master/Encodings.md#run-length-encoding--bit-packing-hybrid-rle--3>
use colchunk_error::{ColchunkError, ErrorKind, Result};

use super::bitpack::{packed_len, unpack};
use super::uleb128::decode_uleb128;

#[derive(Debug)]
pub struct HybridRleDecoder<'a> {
    buf: &'a [u8],
    bit_width: u8,
    offset: usize,
}

impl<'a> HybridRleDecoder<'a> {
    pub fn new(buf: &'a [u8], bit_width: u8) -> Self {
        HybridRleDecoder {
            buf,
            bit_width,
            offset: 0,
        }
    }

    /// Number of bytes read so far.
    pub fn consumed(&self) -> usize {
        self.offset
    }

    /// Decode exactly `num_values` values into `out`.
    pub fn decode(&mut self, num_values: usize, out: &mut Vec<u32>) -> Result<()> {
        if self.bit_width > 32 {
            return Err(ColchunkError::with_kind(
                ErrorKind::InvalidData,
                format!("Invalid bit width for hybrid encoding: {}", self.bit_width),
            ));
        }

        let mut remaining = num_values;
        let mut scratch = Vec::new();

        while remaining > 0 {
            if self.offset >= self.buf.len() {
                return Err(ColchunkError::with_kind(
                    ErrorKind::InvalidData,
                    format!("Hybrid encoded data ended with {remaining} values left to read"),
                ));
            }

            let (header, n) = decode_uleb128(&self.buf[self.offset..])?;
            self.offset += n;
            let run_len = (header >> 1) as usize;

            if header & 1 == 1 {
                // Bit packed run of `run_len` groups of 8 values.
                let count = run_len.saturating_mul(8);
                let byte_len = run_len.saturating_mul(self.bit_width as usize);
                let available = byte_len.min(self.buf.len() - self.offset);
                let take = count.min(remaining);

                if packed_len(take, self.bit_width) > available {
                    return Err(ColchunkError::with_kind(
                        ErrorKind::InvalidData,
                        "Bit packed run extends past end of buffer",
                    ));
                }

                scratch.clear();
                unpack(
                    &self.buf[self.offset..self.offset + available],
                    self.bit_width,
                    take,
                    &mut scratch,
                )?;
                out.extend(scratch.iter().map(|&v| v as u32));

                self.offset += available;
                remaining -= take;
            } else {
                // RLE run, value stored in the minimum number of bytes.
                let value_len = (self.bit_width as usize + 7) / 8;
                let bytes = self
                    .buf
                    .get(self.offset..self.offset + value_len)
                    .ok_or_else(|| {
                        ColchunkError::with_kind(
                            ErrorKind::InvalidData,
                            "RLE run value extends past end of buffer",
                        )
                    })?;

                let mut value_buf = [0; 4];
                value_buf[..value_len].copy_from_slice(bytes);
                let value = u32::from_le_bytes(value_buf);
                self.offset += value_len;

                let take = run_len.min(remaining);
                out.extend(std::iter::repeat(value).take(take));
                remaining -= take;
            }
        }

        Ok(())
    }
}

/// Decode `num_values` levels with the bit width required for `max_level`.
///
/// Returns the levels and the number of bytes read.
pub fn decode_levels(buf: &[u8], max_level: i16, num_values: usize) -> Result<(Vec<i16>, usize)> {
    let bit_width = super::bit_width(max_level as u32);
    let mut decoder = HybridRleDecoder::new(buf, bit_width);
    let mut out = Vec::new();
    decoder.decode(num_values, &mut out)?;

    let mut levels = Vec::with_capacity(out.len());
    for v in out {
        if v > max_level as u32 {
            return Err(ColchunkError::with_kind(
                ErrorKind::InvalidData,
                format!("Level {v} exceeds max level {max_level}"),
            ));
        }
        levels.push(v as i16);
    }

    Ok((levels, decoder.consumed()))
}

/// Encode values as a sequence of RLE runs, one per group of repeated values.
#[cfg(any(test, feature = "testutil"))]
pub fn encode_rle(values: &[u32], bit_width: u8, out: &mut Vec<u8>) {
    use super::uleb128::encode_uleb128;

    let value_len = (bit_width as usize + 7) / 8;
    let mut idx = 0;
    while idx < values.len() {
        let value = values[idx];
        let mut run = 1;
        while idx + run < values.len() && values[idx + run] == value {
            run += 1;
        }

        encode_uleb128((run as u64) << 1, out);
        out.extend_from_slice(&value.to_le_bytes()[..value_len]);
        idx += run;
    }
}

/// Encode values as a single bit packed run, padding to a multiple of 8.
#[cfg(any(test, feature = "testutil"))]
pub fn encode_bitpacked(values: &[u32], bit_width: u8, out: &mut Vec<u8>) {
    use super::bitpack::pack;
    use super::uleb128::encode_uleb128;

    let groups = (values.len() + 7) / 8;
    encode_uleb128(((groups as u64) << 1) | 1, out);

    let mut padded: Vec<u64> = values.iter().map(|&v| v as u64).collect();
    padded.resize(groups * 8, 0);
    pack(&padded, bit_width, out);
}
