//! Decode a column chunk into row values.
use colchunk_error::{ColchunkError, ErrorKind, Result};
use tracing::{debug, trace, warn};

use crate::assemble::assemble_nested;
use crate::compression::{decompress_page, Decompressors};
use crate::convert::convert;
use crate::datapage::{decode_data_page_v1, decode_dictionary_page, DecodedPage};
use crate::datapage_v2::decode_data_page_v2;
use crate::dictionary::{dereference, Dictionary};
use crate::header::decode_page_header;
use crate::metadata::column_chunk::ColumnMetadata;
use crate::metadata::row_group::RowGroupMetadata;
use crate::metadata::schema::Schema;
use crate::page::{DataPageHeaderV1, DataPageHeaderV2, DictionaryPageHeader, PageKind};
use crate::value::Value;

/// Decode all pages of a column chunk.
///
/// `bytes` is the file (or a region of it) and `column_offset` the position
/// of the chunk's first page within it. The returned values line up with the
/// row group's rows.
pub fn read_column(
    bytes: &[u8],
    column_offset: usize,
    row_group: &RowGroupMetadata,
    column: &ColumnMetadata,
    schema: &Schema,
    decompressors: Option<&Decompressors>,
) -> Result<Vec<Value>> {
    ColumnChunkDecoder::try_new(bytes, column_offset, row_group, column, schema, decompressors)?
        .decode()
}

/// State for decoding a single column chunk.
///
/// Owns the current dictionary and the output. Everything else is borrowed.
#[derive(Debug)]
pub struct ColumnChunkDecoder<'a> {
    bytes: &'a [u8],
    column_offset: usize,
    /// Exclusive end of the chunk in `bytes`.
    chunk_end: usize,
    num_rows: usize,
    column: &'a ColumnMetadata,
    schema: &'a Schema,
    decompressors: Option<&'a Decompressors>,
    dictionary: Option<Dictionary>,
    /// Sum of `num_values` across data pages decoded so far.
    values_seen: usize,
    /// Offset relative to `column_offset`.
    byte_offset: usize,
    num_pages: usize,
    row_data: Vec<Value>,
}

impl<'a> ColumnChunkDecoder<'a> {
    pub fn try_new(
        bytes: &'a [u8],
        column_offset: usize,
        row_group: &RowGroupMetadata,
        column: &'a ColumnMetadata,
        schema: &'a Schema,
        decompressors: Option<&'a Decompressors>,
    ) -> Result<Self> {
        let num_rows = usize::try_from(row_group.num_rows).map_err(|_| {
            ColchunkError::with_kind(
                ErrorKind::InvalidData,
                format!("Invalid row group row count: {}", row_group.num_rows),
            )
        })?;

        Ok(ColumnChunkDecoder {
            bytes,
            column_offset,
            chunk_end: column.chunk_end(column_offset, bytes.len()),
            num_rows,
            column,
            schema,
            decompressors,
            dictionary: None,
            values_seen: 0,
            byte_offset: 0,
            num_pages: 0,
            row_data: Vec::new(),
        })
    }

    /// Decode pages until the row group's row count is reached.
    pub fn decode(mut self) -> Result<Vec<Value>> {
        while self.values_seen < self.num_rows {
            if !self.decode_next_page()? {
                break;
            }
        }

        if self.row_data.len() != self.num_rows {
            return Err(ColchunkError::with_kind(
                ErrorKind::RowCountMismatch,
                format!(
                    "Row data length {} does not match row group length {} for column '{}'",
                    self.row_data.len(),
                    self.num_rows,
                    self.path(),
                ),
            ));
        }

        debug!(
            column = %self.path(),
            rows = self.row_data.len(),
            pages = self.num_pages,
            "column chunk decoded"
        );

        Ok(self.row_data)
    }

    /// Decode the page at the cursor. Returns false if the cursor is at the
    /// end of the chunk.
    fn decode_next_page(&mut self) -> Result<bool> {
        let page_start = self.column_offset.saturating_add(self.byte_offset);
        if page_start >= self.chunk_end {
            return Ok(false);
        }

        let (header, header_len) = decode_page_header(&self.bytes[..self.chunk_end], page_start)?;
        self.byte_offset += header_len;

        let body_start = page_start + header_len;
        let body_end = body_start
            .checked_add(header.compressed_page_size)
            .filter(|&end| end <= self.chunk_end)
            .ok_or_else(|| {
                ColchunkError::with_kind(
                    ErrorKind::MalformedHeader,
                    format!(
                        "Compressed page size {} at offset {body_start} runs past the end of column '{}' at {}",
                        header.compressed_page_size,
                        self.path(),
                        self.chunk_end,
                    ),
                )
            })?;
        let bytes = self.bytes;
        let body = &bytes[body_start..body_end];

        trace!(
            kind = header.kind.name(),
            offset = page_start,
            compressed_page_size = header.compressed_page_size,
            uncompressed_page_size = header.uncompressed_page_size,
            "decoding page"
        );

        match &header.kind {
            PageKind::Dictionary(dict_header) => {
                self.decode_dictionary(body, header.uncompressed_page_size, dict_header)?
            }
            PageKind::DataV1(data_header) => {
                self.decode_data_v1(body, header.uncompressed_page_size, data_header)?
            }
            PageKind::DataV2(data_header) => {
                self.decode_data_v2(body, header.uncompressed_page_size, data_header)?
            }
        }

        self.byte_offset += header.compressed_page_size;
        self.num_pages += 1;

        Ok(true)
    }

    fn decode_dictionary(
        &mut self,
        body: &[u8],
        uncompressed_page_size: usize,
        header: &DictionaryPageHeader,
    ) -> Result<()> {
        let page = decompress_page(
            body,
            uncompressed_page_size,
            self.column.codec,
            self.decompressors,
        )?;
        let dictionary = decode_dictionary_page(&page, header, self.column)?;

        debug!(column = %self.path(), entries = dictionary.len(), "dictionary installed");
        self.dictionary = Some(dictionary);

        Ok(())
    }

    fn decode_data_v1(
        &mut self,
        body: &[u8],
        uncompressed_page_size: usize,
        header: &DataPageHeaderV1,
    ) -> Result<()> {
        let page = decompress_page(
            body,
            uncompressed_page_size,
            self.column.codec,
            self.decompressors,
        )?;
        let DecodedPage {
            definition_levels,
            repetition_levels,
            mut values,
            dictionary_encoded,
        } = decode_data_page_v1(&page, header, self.schema, self.column)?;
        self.values_seen += header.num_values;

        let dictionary = self.page_dictionary(dictionary_encoded);
        let path = &self.column.path_in_schema;

        let mut page_rows = if !repetition_levels.is_empty() {
            dereference(dictionary, &mut values)?;
            let is_null = !self.schema.is_required(&path[..path.len().min(1)])?;
            assemble_nested(
                &definition_levels,
                &repetition_levels,
                values,
                is_null,
                self.schema.max_definition_level(path)?,
                self.schema.max_repetition_level(path)?,
            )?
        } else if !definition_levels.is_empty() {
            let mut out = Vec::new();
            reconstruct_nulls(
                &definition_levels,
                self.schema.max_definition_level(path)?,
                values,
                dictionary,
                &mut out,
            )?;
            out
        } else if dictionary_encoded && dictionary.is_none() {
            // Indices without a dictionary to resolve them against.
            values
        } else {
            dereference(dictionary, &mut values)?;
            convert(values, self.schema.resolve_element(path)?)?
        };

        self.row_data.append(&mut page_rows);

        Ok(())
    }

    fn decode_data_v2(
        &mut self,
        body: &[u8],
        uncompressed_page_size: usize,
        header: &DataPageHeaderV2,
    ) -> Result<()> {
        let DecodedPage {
            definition_levels,
            repetition_levels,
            mut values,
            dictionary_encoded,
        } = decode_data_page_v2(
            body,
            uncompressed_page_size,
            header,
            self.schema,
            self.column,
            self.decompressors,
        )?;
        self.values_seen += header.num_values;

        let dictionary = self.page_dictionary(dictionary_encoded);
        let path = &self.column.path_in_schema;

        let mut page_rows = if !repetition_levels.is_empty() {
            dereference(dictionary, &mut values)?;
            assemble_nested(
                &definition_levels,
                &repetition_levels,
                values,
                true,
                self.schema.max_definition_level(path)?,
                self.schema.max_repetition_level(path)?,
            )?
        } else if header.num_nulls > 0 {
            if definition_levels.is_empty() {
                return Err(ColchunkError::with_kind(
                    ErrorKind::MissingLevels,
                    format!(
                        "Data page v2 declares {} nulls without definition levels for column '{}'",
                        header.num_nulls,
                        self.path()
                    ),
                ));
            }
            let mut out = Vec::new();
            reconstruct_nulls(
                &definition_levels,
                self.schema.max_definition_level(path)?,
                values,
                dictionary,
                &mut out,
            )?;
            out
        } else {
            dereference(dictionary, &mut values)?;
            values
        };

        self.row_data.append(&mut page_rows);

        Ok(())
    }

    /// Dictionary to resolve a page's values against. Only pages with a
    /// dictionary encoding hold indices.
    fn page_dictionary(&self, dictionary_encoded: bool) -> Option<&'_ Dictionary> {
        if dictionary_encoded {
            self.dictionary.as_ref()
        } else {
            None
        }
    }

    fn path(&self) -> String {
        self.column.path_in_schema.join(".")
    }
}

/// Expand dense values into one slot per definition level, with nulls where
/// the level is below `max_definition_level`.
///
/// With a dictionary, values are dereferenced and byte arrays decoded as
/// UTF-8 where possible. `output` must be empty.
pub fn reconstruct_nulls(
    definition_levels: &[i16],
    max_definition_level: i16,
    values: Vec<Value>,
    dictionary: Option<&Dictionary>,
    output: &mut Vec<Value>,
) -> Result<()> {
    if !output.is_empty() {
        return Err(ColchunkError::with_kind(
            ErrorKind::PreconditionViolation,
            format!("Output for null reconstruction holds {} values", output.len()),
        ));
    }

    let num_values = values.len();
    let mut values = values.into_iter();
    output.reserve(definition_levels.len());

    for (idx, &def) in definition_levels.iter().enumerate() {
        if def != max_definition_level {
            output.push(Value::Null);
            continue;
        }

        let value = values.next().ok_or_else(|| {
            ColchunkError::with_kind(
                ErrorKind::BoundsViolation,
                format!(
                    "Value index {} exceeds data page length {num_values} at slot {idx}",
                    num_values - values.len()
                ),
            )
        })?;

        let value = match dictionary {
            Some(dictionary) => match dictionary.lookup(&value)? {
                Value::Bytes(bytes) => match String::from_utf8(bytes.clone()) {
                    Ok(s) => Value::String(s),
                    Err(e) => {
                        warn!(%e, slot = idx, "failed to decode dictionary byte array as utf8");
                        Value::Bytes(e.into_bytes())
                    }
                },
                other => other.clone(),
            },
            None => value,
        };

        output.push(value);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionCodec;
    use crate::encoding::Encoding;
    use crate::header::RawPageHeader;
    use crate::metadata::schema::SchemaElement;
    use crate::page::PageType;
    use crate::testutil::*;
    use crate::types::{ConvertedType, PhysicalType, Repetition};

    fn flat_schema(repetition: Repetition, physical_type: PhysicalType) -> Schema {
        Schema::new(vec![
            SchemaElement::root("root", 1),
            SchemaElement::leaf("a", physical_type, repetition),
        ])
    }

    fn string_schema(repetition: Repetition) -> Schema {
        Schema::new(vec![
            SchemaElement::root("root", 1),
            SchemaElement::leaf("a", PhysicalType::ByteArray, repetition)
                .with_converted_type(ConvertedType::Utf8),
        ])
    }

    fn list_schema() -> Schema {
        Schema::new(vec![
            SchemaElement::root("root", 1),
            SchemaElement::group("a", Repetition::Optional, 1)
                .with_converted_type(ConvertedType::List),
            SchemaElement::group("list", Repetition::Repeated, 1),
            SchemaElement::leaf("element", PhysicalType::Int32, Repetition::Optional),
        ])
    }

    fn decode(
        builder: ChunkBuilder,
        num_rows: i64,
        schema: &Schema,
        path: &[&str],
        physical_type: PhysicalType,
    ) -> Result<Vec<Value>> {
        let column = builder.column_metadata(path, physical_type);
        let bytes = builder.finish();
        read_column(
            &bytes,
            column.column_offset()?,
            &RowGroupMetadata::new(num_rows),
            &column,
            schema,
            None,
        )
    }

    #[test]
    fn required_plain_single_page() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(&plain_int32(&[1, 2, 3]), 3, Encoding::Plain)
            .unwrap();

        let rows = decode(
            b,
            3,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap();

        assert_eq!(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)], rows);
    }

    #[test]
    fn dictionary_then_snappy_data_page() {
        let mut b = ChunkBuilder::with_prefix(CompressionCodec::Snappy, 4);
        b.dictionary_page(&plain_byte_array(&[b"red", b"blue"]), 2)
            .unwrap();
        b.data_page_v1(
            &encode_dictionary_indices(&[1, 0, 1]),
            3,
            Encoding::RleDictionary,
        )
        .unwrap();

        let rows = decode(
            b,
            3,
            &string_schema(Repetition::Required),
            &["a"],
            PhysicalType::ByteArray,
        )
        .unwrap();

        assert_eq!(
            vec![Value::from("blue"), Value::from("red"), Value::from("blue")],
            rows
        );
    }

    #[test]
    fn optional_with_nulls_across_pages() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(
            &data_page_v1_body(&[], 0, &[1, 0, 1], 1, &plain_int64(&[10, 30])),
            3,
            Encoding::Plain,
        )
        .unwrap();
        b.data_page_v1(
            &data_page_v1_body(&[], 0, &[0, 1], 1, &plain_int64(&[50])),
            2,
            Encoding::Plain,
        )
        .unwrap();

        let rows = decode(
            b,
            5,
            &flat_schema(Repetition::Optional, PhysicalType::Int64),
            &["a"],
            PhysicalType::Int64,
        )
        .unwrap();

        assert_eq!(
            vec![
                Value::Int64(10),
                Value::Null,
                Value::Int64(30),
                Value::Null,
                Value::Int64(50)
            ],
            rows
        );
    }

    #[test]
    fn dictionary_with_nulls_decodes_utf8() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.dictionary_page(&plain_byte_array(&[b"x", &[0xFF, 0xFE]]), 2)
            .unwrap();
        b.data_page_v1(
            &data_page_v1_body(&[], 0, &[1, 0, 1], 1, &encode_dictionary_indices(&[0, 1])),
            3,
            Encoding::RleDictionary,
        )
        .unwrap();

        let rows = decode(
            b,
            3,
            &string_schema(Repetition::Optional),
            &["a"],
            PhysicalType::ByteArray,
        )
        .unwrap();

        // Invalid utf8 is kept as bytes.
        assert_eq!(
            vec![Value::from("x"), Value::Null, Value::Bytes(vec![0xFF, 0xFE])],
            rows
        );
    }

    #[test]
    fn nested_list_v1() {
        // [[1, 2], null, [], [null]]
        let def = [3, 3, 0, 1, 2];
        let rep = [0, 1, 0, 0, 0];
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(
            &data_page_v1_body(&rep, 1, &def, 3, &plain_int32(&[1, 2])),
            5,
            Encoding::Plain,
        )
        .unwrap();

        let rows = decode(
            b,
            4,
            &list_schema(),
            &["a", "list", "element"],
            PhysicalType::Int32,
        );

        // Page counts 5 values against 4 rows, so the loop ends after the page.
        assert_eq!(
            vec![
                Value::List(vec![Value::Int32(1), Value::Int32(2)]),
                Value::Null,
                Value::List(vec![]),
                Value::List(vec![Value::Null]),
            ],
            rows.unwrap()
        );
    }

    #[test]
    fn v2_page_with_nulls() {
        let mut b = ChunkBuilder::new(CompressionCodec::Snappy);
        b.data_page_v2(DataPageV2 {
            definition_levels: encode_levels(&[0, 1, 1], 1),
            values: plain_int32(&[4, 5]),
            num_values: 3,
            num_nulls: 1,
            num_rows: 3,
            encoding: Encoding::Plain,
            ..Default::default()
        })
        .unwrap();

        let rows = decode(
            b,
            3,
            &flat_schema(Repetition::Optional, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap();

        assert_eq!(vec![Value::Null, Value::Int32(4), Value::Int32(5)], rows);
    }

    #[test]
    fn v2_multiple_pages_with_nulls() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        for _ in 0..2 {
            b.data_page_v2(DataPageV2 {
                definition_levels: encode_levels(&[1, 0], 1),
                values: plain_int32(&[7]),
                num_values: 2,
                num_nulls: 1,
                num_rows: 2,
                encoding: Encoding::Plain,
                ..Default::default()
            })
            .unwrap();
        }

        let rows = decode(
            b,
            4,
            &flat_schema(Repetition::Optional, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap();

        assert_eq!(
            vec![Value::Int32(7), Value::Null, Value::Int32(7), Value::Null],
            rows
        );
    }

    #[test]
    fn v2_dictionary_no_nulls() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.dictionary_page(&plain_int32(&[100, 200]), 2).unwrap();
        b.data_page_v2(DataPageV2 {
            values: encode_dictionary_indices(&[1, 1, 0]),
            num_values: 3,
            num_rows: 3,
            encoding: Encoding::RleDictionary,
            ..Default::default()
        })
        .unwrap();

        let rows = decode(
            b,
            3,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap();

        assert_eq!(
            vec![Value::Int32(200), Value::Int32(200), Value::Int32(100)],
            rows
        );
    }

    #[test]
    fn v2_nulls_without_levels() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v2(DataPageV2 {
            values: plain_int32(&[1]),
            num_values: 2,
            num_nulls: 1,
            num_rows: 2,
            encoding: Encoding::Plain,
            ..Default::default()
        })
        .unwrap();

        let err = decode(
            b,
            2,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::MissingLevels, err.kind());
    }

    #[test]
    fn later_dictionary_replaces_earlier() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.dictionary_page(&plain_int32(&[1, 2]), 2).unwrap();
        b.data_page_v1(&encode_dictionary_indices(&[0]), 1, Encoding::PlainDictionary)
            .unwrap();
        b.dictionary_page(&plain_int32(&[8, 9]), 2).unwrap();
        b.data_page_v1(&encode_dictionary_indices(&[0]), 1, Encoding::PlainDictionary)
            .unwrap();

        let rows = decode(
            b,
            2,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap();

        assert_eq!(vec![Value::Int32(1), Value::Int32(8)], rows);
    }

    #[test]
    fn plain_page_after_dictionary_not_dereferenced() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.dictionary_page(&plain_int32(&[100, 200]), 2).unwrap();
        b.data_page_v1(&plain_int32(&[5]), 1, Encoding::Plain)
            .unwrap();

        let rows = decode(
            b,
            1,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap();

        assert_eq!(vec![Value::Int32(5)], rows);
    }

    #[test]
    fn dictionary_index_out_of_range() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.dictionary_page(&plain_int32(&[100]), 1).unwrap();
        b.data_page_v1(&encode_dictionary_indices(&[3]), 1, Encoding::RleDictionary)
            .unwrap();

        let err = decode(
            b,
            1,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::BoundsViolation, err.kind());
    }

    #[test]
    fn row_count_mismatch_when_chunk_ends_early() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(&plain_int32(&[1, 2]), 2, Encoding::Plain)
            .unwrap();

        let err = decode(
            b,
            3,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::RowCountMismatch, err.kind());
    }

    #[test]
    fn row_count_mismatch_when_page_overshoots() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(&plain_int32(&[1, 2, 3]), 3, Encoding::Plain)
            .unwrap();

        let err = decode(
            b,
            2,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::RowCountMismatch, err.kind());
    }

    #[test]
    fn huge_row_count_is_mismatch() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(&plain_int64(&[7]), 1, Encoding::Plain)
            .unwrap();

        let err = decode(
            b,
            i64::MAX,
            &flat_schema(Repetition::Required, PhysicalType::Int64),
            &["a"],
            PhysicalType::Int64,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::RowCountMismatch, err.kind());
    }

    #[test]
    fn delta_page_with_huge_value_count() {
        // Block size 128, 4 miniblocks, 2^62 values, first value 0.
        let mut body = Vec::new();
        for v in [128, 4, 1 << 62, 0] {
            crate::encoding::uleb128::encode_uleb128(v, &mut body);
        }

        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(&body, 1, Encoding::DeltaBinaryPacked)
            .unwrap();

        let rows = decode(
            b,
            1,
            &flat_schema(Repetition::Required, PhysicalType::Int64),
            &["a"],
            PhysicalType::Int64,
        )
        .unwrap();
        assert_eq!(vec![Value::Int64(0)], rows);
    }

    #[test]
    fn delta_page_short_of_declared_values() {
        let mut body = Vec::new();
        for v in [128, 4, 1 << 62, 0] {
            crate::encoding::uleb128::encode_uleb128(v, &mut body);
        }

        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(&body, 3, Encoding::DeltaBinaryPacked)
            .unwrap();

        let err = decode(
            b,
            3,
            &flat_schema(Repetition::Required, PhysicalType::Int64),
            &["a"],
            PhysicalType::Int64,
        )
        .unwrap_err();
        assert_eq!(ErrorKind::InvalidData, err.kind());
    }

    #[test]
    fn zero_rows_reads_nothing() {
        // Garbage where a header would be is never touched.
        let bytes = vec![0xFF; 8];
        let column = ChunkBuilder::new(CompressionCodec::Uncompressed)
            .column_metadata(&["a"], PhysicalType::Int32);

        let rows = read_column(
            &bytes,
            0,
            &RowGroupMetadata::new(0),
            &column,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            None,
        )
        .unwrap();

        assert!(rows.is_empty());
    }

    #[test]
    fn compressed_size_past_chunk_end() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        let header = RawPageHeader {
            page_type: Some(PageType::DataPage.to_thrift()),
            uncompressed_page_size: Some(100),
            compressed_page_size: Some(100),
            data_page_header: Some(crate::header::RawDataPageHeader {
                num_values: Some(1),
                encoding: Some(Encoding::Plain.to_thrift()),
                definition_level_encoding: Some(Encoding::Rle.to_thrift()),
                repetition_level_encoding: Some(Encoding::Rle.to_thrift()),
            }),
            ..Default::default()
        };
        b.raw_page(&header, &plain_int32(&[1])).unwrap();

        let err = decode(
            b,
            1,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::MalformedHeader, err.kind());
    }

    #[test]
    fn missing_compressed_page_size() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        let header = RawPageHeader {
            page_type: Some(PageType::DataPage.to_thrift()),
            uncompressed_page_size: Some(4),
            compressed_page_size: None,
            ..Default::default()
        };
        b.raw_page(&header, &plain_int32(&[1])).unwrap();

        let err = decode(
            b,
            1,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::MalformedHeader, err.kind());
    }

    #[test]
    fn index_page_unsupported() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        let header = RawPageHeader {
            page_type: Some(PageType::IndexPage.to_thrift()),
            uncompressed_page_size: Some(0),
            compressed_page_size: Some(0),
            ..Default::default()
        };
        b.raw_page(&header, &[]).unwrap();

        let err = decode(
            b,
            1,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::MalformedHeader, err.kind());
    }

    #[test]
    fn unsupported_codec() {
        let mut b = ChunkBuilder::new(CompressionCodec::Lzo);
        b.data_page_v1(&plain_int32(&[1]), 1, Encoding::Plain)
            .unwrap();

        let err = decode(
            b,
            1,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            &["a"],
            PhysicalType::Int32,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::UnsupportedCodec, err.kind());
    }

    #[test]
    fn decompressor_override() {
        let mut b = ChunkBuilder::new(CompressionCodec::Zstd);
        b.data_page_v1(&plain_int32(&[9, 8]), 2, Encoding::Plain)
            .unwrap();
        let column = b.column_metadata(&["a"], PhysicalType::Int32);
        let bytes = b.finish();

        let decompressors = Decompressors::new().with(CompressionCodec::Zstd, |input, _| Ok(input.to_vec()));
        let rows = read_column(
            &bytes,
            column.column_offset().unwrap(),
            &RowGroupMetadata::new(2),
            &column,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            Some(&decompressors),
        )
        .unwrap();

        assert_eq!(vec![Value::Int32(9), Value::Int32(8)], rows);
    }

    #[test]
    fn chunk_bounded_by_compressed_size() {
        let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
        b.data_page_v1(&plain_int32(&[1]), 1, Encoding::Plain)
            .unwrap();
        let column = b.column_metadata(&["a"], PhysicalType::Int32);
        let mut bytes = b.finish();

        // A second valid page follows, but lies outside the chunk.
        let mut next = ChunkBuilder::new(CompressionCodec::Uncompressed);
        next.data_page_v1(&plain_int32(&[2]), 1, Encoding::Plain)
            .unwrap();
        bytes.extend(next.finish());

        let err = read_column(
            &bytes,
            0,
            &RowGroupMetadata::new(2),
            &column,
            &flat_schema(Repetition::Required, PhysicalType::Int32),
            None,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::RowCountMismatch, err.kind());
    }

    #[test]
    fn reconstruct_nulls_basic() {
        let mut out = Vec::new();
        reconstruct_nulls(
            &[1, 0, 1, 0],
            1,
            vec![Value::Int32(1), Value::Int32(2)],
            None,
            &mut out,
        )
        .unwrap();

        assert_eq!(
            vec![Value::Int32(1), Value::Null, Value::Int32(2), Value::Null],
            out
        );
    }

    #[test]
    fn reconstruct_nulls_all_null() {
        let mut out = Vec::new();
        reconstruct_nulls(&[0, 0], 1, Vec::new(), None, &mut out).unwrap();
        assert_eq!(vec![Value::Null, Value::Null], out);
    }

    #[test]
    fn reconstruct_nulls_output_not_empty() {
        let mut out = vec![Value::Null];
        let err = reconstruct_nulls(&[1], 1, vec![Value::Int32(1)], None, &mut out).unwrap_err();
        assert_eq!(ErrorKind::PreconditionViolation, err.kind());
    }

    #[test]
    fn reconstruct_nulls_too_few_values() {
        let mut out = Vec::new();
        let err =
            reconstruct_nulls(&[1, 1], 1, vec![Value::Int32(1)], None, &mut out).unwrap_err();
        assert_eq!(ErrorKind::BoundsViolation, err.kind());
    }

    #[test]
    fn reconstruct_nulls_dictionary_strings() {
        let dict = Dictionary::new(vec![Value::Bytes(b"ok".to_vec()), Value::Int32(4)]);
        let mut out = Vec::new();
        reconstruct_nulls(
            &[1, 0, 1],
            1,
            vec![Value::Int32(0), Value::Int32(1)],
            Some(&dict),
            &mut out,
        )
        .unwrap();

        assert_eq!(vec![Value::from("ok"), Value::Null, Value::Int32(4)], out);
    }
}
