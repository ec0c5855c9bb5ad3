//! Builders for writing column chunks byte by byte in tests.
use colchunk_error::{ColchunkError, Result, ResultExt};

use crate::compression::CompressionCodec;
use crate::encoding::hybrid_rle::encode_rle;
use crate::encoding::{bit_width, Encoding};
use crate::header::{
    encode_raw_page_header, RawDataPageHeader, RawDataPageHeaderV2, RawDictionaryPageHeader,
    RawPageHeader,
};
use crate::metadata::column_chunk::ColumnMetadata;
use crate::page::PageType;
use crate::types::PhysicalType;

/// Writes pages into a buffer, tracking offsets for the column metadata.
///
/// Pages are compressed with snappy when the codec is snappy. Every other
/// codec writes pages as is, pair those with an identity decompressor
/// override.
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    codec: CompressionCodec,
    buf: Vec<u8>,
    chunk_start: usize,
    data_page_offset: Option<usize>,
    dictionary_page_offset: Option<usize>,
    num_values: usize,
}

impl ChunkBuilder {
    pub fn new(codec: CompressionCodec) -> Self {
        Self::with_prefix(codec, 0)
    }

    /// Start the chunk after `prefix_len` filler bytes.
    pub fn with_prefix(codec: CompressionCodec, prefix_len: usize) -> Self {
        Self::with_buffer(codec, vec![0xEE; prefix_len])
    }

    /// Start the chunk at the end of `buf`, e.g. after previously written
    /// column chunks.
    pub fn with_buffer(codec: CompressionCodec, buf: Vec<u8>) -> Self {
        ChunkBuilder {
            codec,
            chunk_start: buf.len(),
            buf,
            data_page_offset: None,
            dictionary_page_offset: None,
            num_values: 0,
        }
    }

    pub fn dictionary_page(&mut self, body: &[u8], num_values: usize) -> Result<()> {
        self.dictionary_page_offset.get_or_insert(self.buf.len());
        let compressed = self.compress(body)?;

        let header = RawPageHeader {
            page_type: Some(PageType::DictionaryPage.to_thrift()),
            uncompressed_page_size: Some(to_i32(body.len())?),
            compressed_page_size: Some(to_i32(compressed.len())?),
            dictionary_page_header: Some(RawDictionaryPageHeader {
                num_values: Some(to_i32(num_values)?),
                encoding: Some(Encoding::PlainDictionary.to_thrift()),
                is_sorted: None,
            }),
            ..Default::default()
        };

        self.write_page(&header, &compressed)
    }

    /// Write a v1 data page, `body` holding the already encoded levels and
    /// values.
    pub fn data_page_v1(&mut self, body: &[u8], num_values: usize, encoding: Encoding) -> Result<()> {
        self.data_page_offset.get_or_insert(self.buf.len());
        self.num_values += num_values;
        let compressed = self.compress(body)?;

        let header = RawPageHeader {
            page_type: Some(PageType::DataPage.to_thrift()),
            uncompressed_page_size: Some(to_i32(body.len())?),
            compressed_page_size: Some(to_i32(compressed.len())?),
            data_page_header: Some(RawDataPageHeader {
                num_values: Some(to_i32(num_values)?),
                encoding: Some(encoding.to_thrift()),
                definition_level_encoding: Some(Encoding::Rle.to_thrift()),
                repetition_level_encoding: Some(Encoding::Rle.to_thrift()),
            }),
            ..Default::default()
        };

        self.write_page(&header, &compressed)
    }

    /// Write a v2 data page. Levels are written uncompressed, values are
    /// compressed with the chunk's codec.
    pub fn data_page_v2(&mut self, page: DataPageV2) -> Result<()> {
        self.data_page_offset.get_or_insert(self.buf.len());
        self.num_values += page.num_values;
        let compressed_values = self.compress(&page.values)?;

        let levels_len = page.repetition_levels.len() + page.definition_levels.len();
        let header = RawPageHeader {
            page_type: Some(PageType::DataPageV2.to_thrift()),
            uncompressed_page_size: Some(to_i32(levels_len + page.values.len())?),
            compressed_page_size: Some(to_i32(levels_len + compressed_values.len())?),
            data_page_header_v2: Some(RawDataPageHeaderV2 {
                num_values: Some(to_i32(page.num_values)?),
                num_nulls: Some(to_i32(page.num_nulls)?),
                num_rows: Some(to_i32(page.num_rows)?),
                encoding: Some(page.encoding.to_thrift()),
                definition_levels_byte_length: Some(to_i32(page.definition_levels.len())?),
                repetition_levels_byte_length: Some(to_i32(page.repetition_levels.len())?),
                is_compressed: None,
            }),
            ..Default::default()
        };

        let mut body = page.repetition_levels;
        body.extend_from_slice(&page.definition_levels);
        body.extend_from_slice(&compressed_values);

        self.write_page(&header, &body)
    }

    /// Write a page with a caller provided header.
    pub fn raw_page(&mut self, header: &RawPageHeader, body: &[u8]) -> Result<()> {
        self.data_page_offset.get_or_insert(self.buf.len());
        self.write_page(header, body)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Column metadata for the pages written so far.
    pub fn column_metadata(&self, path: &[&str], physical_type: PhysicalType) -> ColumnMetadata {
        let chunk_len = (self.buf.len() - self.chunk_start) as i64;
        ColumnMetadata {
            physical_type,
            encodings: vec![Encoding::Plain, Encoding::Rle, Encoding::RleDictionary],
            path_in_schema: path.iter().map(|s| s.to_string()).collect(),
            codec: self.codec,
            num_values: self.num_values as i64,
            total_uncompressed_size: chunk_len,
            total_compressed_size: chunk_len,
            data_page_offset: self.data_page_offset.unwrap_or(self.chunk_start) as i64,
            dictionary_page_offset: self.dictionary_page_offset.map(|o| o as i64),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn write_page(&mut self, header: &RawPageHeader, body: &[u8]) -> Result<()> {
        let header = encode_raw_page_header(header)?;
        self.buf.extend_from_slice(&header);
        self.buf.extend_from_slice(body);
        Ok(())
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.codec {
            CompressionCodec::Snappy => snap::raw::Encoder::new()
                .compress_vec(data)
                .context("Failed to snappy compress page"),
            _ => Ok(data.to_vec()),
        }
    }
}

/// Sections of a v2 data page.
#[derive(Debug, Clone, Default)]
pub struct DataPageV2 {
    pub repetition_levels: Vec<u8>,
    pub definition_levels: Vec<u8>,
    /// Uncompressed values section.
    pub values: Vec<u8>,
    pub num_values: usize,
    pub num_nulls: usize,
    pub num_rows: usize,
    pub encoding: Encoding,
}

/// Hybrid encode levels without a length prefix.
pub fn encode_levels(levels: &[i16], max_level: i16) -> Vec<u8> {
    let values: Vec<u32> = levels.iter().map(|&l| l as u32).collect();
    let mut out = Vec::new();
    encode_rle(&values, bit_width(max_level as u32), &mut out);
    out
}

/// Prepend the u32 little endian length of `section` to it, appending both to
/// `out`.
pub fn write_prefixed(section: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&(section.len() as u32).to_le_bytes());
    out.extend_from_slice(section);
}

/// Body of a v1 data page: prefixed repetition levels (when `max_rep` > 0),
/// prefixed definition levels (when `max_def` > 0), then the values.
pub fn data_page_v1_body(
    repetition_levels: &[i16],
    max_rep: i16,
    definition_levels: &[i16],
    max_def: i16,
    values: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    if max_rep > 0 {
        write_prefixed(&encode_levels(repetition_levels, max_rep), &mut out);
    }
    if max_def > 0 {
        write_prefixed(&encode_levels(definition_levels, max_def), &mut out);
    }
    out.extend_from_slice(values);
    out
}

/// Dictionary indices as written in a data page: bit width byte, then hybrid
/// encoded indices.
pub fn encode_dictionary_indices(indices: &[u32]) -> Vec<u8> {
    let max = indices.iter().copied().max().unwrap_or(0);
    let width = bit_width(max).max(1);
    let mut out = vec![width];
    encode_rle(indices, width, &mut out);
    out
}

pub fn plain_int32(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn plain_int64(values: &[i64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn plain_byte_array(values: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        write_prefixed(v, &mut out);
    }
    out
}

fn to_i32(v: usize) -> Result<i32> {
    i32::try_from(v).map_err(|_| ColchunkError::new(format!("Value {v} too large for header")))
}
