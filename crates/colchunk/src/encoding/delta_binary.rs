//! Decoder for delta encoding.
//!
//! See <https://github.com/apache/parquet-format/blob/master/Encodings.md#delta-encoding-delta_binary_packed--5>
use colchunk_error::{ColchunkError, ErrorKind, Result};

use super::bitpack::{packed_len, unpack};
use super::uleb128::decode_uleb128;

/// Signed alternative to ULEB that zigzags before ULEBing.
pub fn decode_zigzag_uleb128(buf: &[u8]) -> Result<(i64, usize)> {
    let (v, num_bytes) = decode_uleb128(buf)?;
    let v = (v >> 1) as i64 ^ -((v & 1) as i64);
    Ok((v, num_bytes))
}

#[derive(Debug)]
pub struct DeltaBinaryDecoder<'a> {
    buf: &'a [u8],
    /// Number of values in each block.
    block_size: usize,
    /// Number of miniblocks per block.
    miniblocks_per_block: usize,
    /// Total number of values.
    total_values: usize,
    /// First value in the page.
    first_value: i64,
}

impl<'a> DeltaBinaryDecoder<'a> {
    /// Try to create a new decoder, initializing the decoder state by reading
    /// the header from `buf`.
    pub fn try_new(mut buf: &'a [u8]) -> Result<Self> {
        // <block size in values> <number of miniblocks in a block> <total value count> <first value>
        let (block_size, num_read) = decode_uleb128(buf)?;
        buf = &buf[num_read..];

        let (miniblocks_per_block, num_read) = decode_uleb128(buf)?;
        buf = &buf[num_read..];

        let (total_values, num_read) = decode_uleb128(buf)?;
        buf = &buf[num_read..];

        let (first_value, num_read) = decode_zigzag_uleb128(buf)?;
        buf = &buf[num_read..];

        if block_size == 0 || block_size % 128 != 0 || block_size > u32::MAX as u64 {
            return Err(invalid("Expected block size to be a multiple of 128 that fits in 32 bits"));
        }

        if miniblocks_per_block == 0 || block_size % miniblocks_per_block != 0 {
            return Err(invalid(
                "Expected block size to be a multiple of miniblocks per block",
            ));
        }

        if (block_size / miniblocks_per_block) % 32 != 0 {
            return Err(invalid(
                "Expected values per miniblock to be multiple of 32",
            ));
        }

        Ok(DeltaBinaryDecoder {
            buf,
            block_size: block_size as usize,
            miniblocks_per_block: miniblocks_per_block as usize,
            total_values: total_values as usize,
            first_value,
        })
    }

    pub fn total_values(&self) -> usize {
        self.total_values
    }

    /// Decode up to `num_values` values from the page, fewer if the page
    /// holds fewer.
    ///
    /// Arithmetic wraps, so values decoded here can be truncated to i32 for
    /// INT32 columns.
    pub fn decode_values(&mut self, num_values: usize, out: &mut Vec<i64>) -> Result<()> {
        let count = self.total_values.min(num_values);
        if count == 0 {
            return Ok(());
        }

        out.push(self.first_value);

        let mut num_decoded = 1;
        let mut previous_value = self.first_value;

        while num_decoded < count {
            let remaining = count - num_decoded;
            let decoded = self.decode_block(&mut previous_value, remaining, out)?;
            num_decoded += decoded;
        }

        Ok(())
    }

    /// Decode a single block, returning the number of values decoded.
    fn decode_block(
        &mut self,
        previous_value: &mut i64,
        mut remaining: usize,
        out: &mut Vec<i64>,
    ) -> Result<usize> {
        let (min_delta, num_bytes) = decode_zigzag_uleb128(self.buf)?;
        self.buf = &self.buf[num_bytes..];

        if self.buf.len() < self.miniblocks_per_block {
            return Err(invalid("Missing miniblock bit widths"));
        }
        let (bit_widths, rest) = self.buf.split_at(self.miniblocks_per_block);
        self.buf = rest;

        let values_per_miniblock = self.block_size / self.miniblocks_per_block;
        let mut deltas = Vec::new();
        let mut num_decoded = 0;

        for &bit_width in bit_widths {
            // Trailing miniblocks may have a bit width but no data.
            if remaining == 0 {
                break;
            }

            let take = values_per_miniblock.min(remaining);
            let byte_len = packed_len(values_per_miniblock, bit_width).min(self.buf.len());
            if packed_len(take, bit_width) > byte_len {
                return Err(invalid("Miniblock extends past end of buffer"));
            }

            deltas.clear();
            unpack(&self.buf[..byte_len], bit_width, take, &mut deltas)?;
            self.buf = &self.buf[byte_len..];

            for &delta in &deltas {
                let v = previous_value
                    .wrapping_add(min_delta)
                    .wrapping_add(delta as i64);
                out.push(v);
                *previous_value = v;
            }

            remaining -= take;
            num_decoded += take;
        }

        Ok(num_decoded)
    }
}

fn invalid(msg: &'static str) -> ColchunkError {
    ColchunkError::with_kind(ErrorKind::InvalidData, msg)
}
