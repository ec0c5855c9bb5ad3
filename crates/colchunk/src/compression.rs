//! Page decompression.
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use colchunk_error::{ColchunkError, ErrorKind, Result};
use hashbrown::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionCodec {
    Uncompressed,
    Snappy,
    Gzip,
    Lzo,
    Brotli,
    Lz4,
    Zstd,
    Lz4Raw,
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uncompressed => "UNCOMPRESSED",
            Self::Snappy => "SNAPPY",
            Self::Gzip => "GZIP",
            Self::Lzo => "LZO",
            Self::Brotli => "BROTLI",
            Self::Lz4 => "LZ4",
            Self::Zstd => "ZSTD",
            Self::Lz4Raw => "LZ4_RAW",
        };
        write!(f, "{s}")
    }
}

/// Decompress `compressed` into a buffer of `uncompressed_size` bytes.
pub type DecompressFn = dyn Fn(&[u8], usize) -> Result<Vec<u8>> + Send + Sync;

/// Caller supplied decompressors, keyed by codec.
///
/// A registered decompressor takes priority over the built-in snappy
/// support. Cheap to clone and safe to share across threads decoding
/// different column chunks.
#[derive(Clone, Default)]
pub struct Decompressors {
    overrides: HashMap<CompressionCodec, Arc<DecompressFn>>,
}

impl Decompressors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create decompressors for every codec enabled through crate features.
    pub fn with_builtin() -> Self {
        #[allow(unused_mut)]
        let mut decompressors = Self::new();

        #[cfg(feature = "gzip")]
        decompressors.register(CompressionCodec::Gzip, builtin::gzip);
        #[cfg(feature = "zstd")]
        decompressors.register(CompressionCodec::Zstd, builtin::zstd);
        #[cfg(feature = "brotli")]
        decompressors.register(CompressionCodec::Brotli, builtin::brotli);
        #[cfg(feature = "lz4")]
        decompressors.register(CompressionCodec::Lz4Raw, builtin::lz4_raw);

        decompressors
    }

    /// Register a decompressor for a codec, replacing any existing one.
    pub fn register<F>(&mut self, codec: CompressionCodec, f: F)
    where
        F: Fn(&[u8], usize) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.overrides.insert(codec, Arc::new(f));
    }

    pub fn with<F>(mut self, codec: CompressionCodec, f: F) -> Self
    where
        F: Fn(&[u8], usize) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.register(codec, f);
        self
    }

    pub fn get(&self, codec: CompressionCodec) -> Option<&DecompressFn> {
        self.overrides.get(&codec).map(|f| f.as_ref())
    }
}

impl fmt::Debug for Decompressors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.overrides.keys()).finish()
    }
}

/// Decompress a page.
///
/// Uncompressed pages are returned as-is. The output is always checked to be
/// exactly `uncompressed_size` bytes.
pub fn decompress_page<'a>(
    compressed: &'a [u8],
    uncompressed_size: usize,
    codec: CompressionCodec,
    decompressors: Option<&Decompressors>,
) -> Result<Cow<'a, [u8]>> {
    let custom = decompressors.and_then(|d| d.get(codec));

    let page: Cow<[u8]> = match (codec, custom) {
        (CompressionCodec::Uncompressed, _) => Cow::Borrowed(compressed),
        (_, Some(f)) => {
            trace!(%codec, compressed_len = compressed.len(), uncompressed_size, "decompressing with override");
            Cow::Owned(f(compressed, uncompressed_size)?)
        }
        #[cfg(feature = "snap")]
        (CompressionCodec::Snappy, None) => Cow::Owned(snappy(compressed, uncompressed_size)?),
        (codec, None) => {
            return Err(ColchunkError::with_kind(
                ErrorKind::UnsupportedCodec,
                format!("Unsupported compression codec: {codec}"),
            ))
        }
    };

    if page.len() != uncompressed_size {
        return Err(ColchunkError::with_kind(
            ErrorKind::DecompressionMismatch,
            format!(
                "Decompressed page length {} does not match header {uncompressed_size}",
                page.len()
            ),
        ));
    }

    Ok(page)
}

#[cfg(feature = "snap")]
fn snappy(compressed: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    use colchunk_error::ResultExt;

    let len = snap::raw::decompress_len(compressed).context("Failed to read snappy length")?;
    if len != uncompressed_size {
        return Err(ColchunkError::with_kind(
            ErrorKind::DecompressionMismatch,
            format!("Snappy page decompresses to {len} bytes, header declares {uncompressed_size}"),
        ));
    }

    let mut buf = vec![0; uncompressed_size];
    let n = snap::raw::Decoder::new()
        .decompress(compressed, &mut buf)
        .context("Failed to decompress snappy page")?;
    buf.truncate(n);

    Ok(buf)
}

#[cfg(any(feature = "gzip", feature = "zstd", feature = "brotli", feature = "lz4"))]
mod builtin {
    #[allow(unused_imports)]
    use std::io::Read;

    use colchunk_error::{Result, ResultExt};

    #[cfg(feature = "gzip")]
    pub fn gzip(compressed: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        flate2::read::MultiGzDecoder::new(compressed)
            .take(read_limit(uncompressed_size))
            .read_to_end(&mut out)
            .context("Failed to decompress gzip page")?;
        Ok(out)
    }

    #[cfg(feature = "zstd")]
    pub fn zstd(compressed: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        zstd::stream::read::Decoder::new(compressed)
            .context("Failed to create zstd decoder")?
            .take(read_limit(uncompressed_size))
            .read_to_end(&mut out)
            .context("Failed to decompress zstd page")?;
        Ok(out)
    }

    #[cfg(feature = "brotli")]
    pub fn brotli(compressed: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        const BROTLI_DEFAULT_BUFFER_SIZE: usize = 4096;

        let mut out = Vec::new();
        brotli::Decompressor::new(compressed, BROTLI_DEFAULT_BUFFER_SIZE)
            .take(read_limit(uncompressed_size))
            .read_to_end(&mut out)
            .context("Failed to decompress brotli page")?;
        Ok(out)
    }

    #[cfg(feature = "lz4")]
    pub fn lz4_raw(compressed: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        lz4_flex::block::decompress(compressed, uncompressed_size)
            .context("Failed to decompress lz4 page")
    }

    /// Stream decoders stop one byte past the declared size so an oversized
    /// page shows up as a length mismatch.
    #[cfg(any(feature = "gzip", feature = "zstd", feature = "brotli"))]
    fn read_limit(uncompressed_size: usize) -> u64 {
        uncompressed_size as u64 + 1
    }
}
