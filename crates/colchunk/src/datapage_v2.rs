//! Data page v2 body decoding.
//!
//! Unlike v1 pages, levels are stored uncompressed ahead of the values with
//! their byte lengths in the header. Only the values section is compressed.
use colchunk_error::{ColchunkError, ErrorKind, Result};

use crate::compression::{decompress_page, Decompressors};
use crate::datapage::{decode_values, DecodedPage};
use crate::encoding::hybrid_rle::decode_levels;
use crate::metadata::column_chunk::ColumnMetadata;
use crate::metadata::schema::Schema;
use crate::page::DataPageHeaderV2;

/// Decode a v2 data page from its still compressed bytes.
pub fn decode_data_page_v2(
    page: &[u8],
    uncompressed_page_size: usize,
    header: &DataPageHeaderV2,
    schema: &Schema,
    column: &ColumnMetadata,
    decompressors: Option<&Decompressors>,
) -> Result<DecodedPage> {
    let path = &column.path_in_schema;
    let max_rep = schema.max_repetition_level(path)?;
    let max_def = schema.max_definition_level(path)?;

    let rep_len = header.repetition_levels_byte_length;
    let def_len = header.definition_levels_byte_length;
    let levels_len = rep_len.saturating_add(def_len);
    if levels_len > page.len() {
        return Err(ColchunkError::with_kind(
            ErrorKind::InvalidData,
            format!(
                "Level byte lengths ({rep_len} + {def_len}) exceed page size {}",
                page.len()
            ),
        ));
    }

    let (rep_buf, rest) = page.split_at(rep_len);
    let (def_buf, values_buf) = rest.split_at(def_len);

    let repetition_levels = if max_rep > 0 {
        decode_levels(rep_buf, max_rep, header.num_values)?.0
    } else {
        Vec::new()
    };

    let definition_levels = if max_def > 0 {
        decode_levels(def_buf, max_def, header.num_values)?.0
    } else {
        Vec::new()
    };

    let num_dense = header
        .num_values
        .checked_sub(header.num_nulls)
        .ok_or_else(|| {
            ColchunkError::with_kind(
                ErrorKind::InvalidData,
                format!(
                    "Page declares {} nulls but only {} values",
                    header.num_nulls, header.num_values
                ),
            )
        })?;

    let values_size = uncompressed_page_size.checked_sub(levels_len).ok_or_else(|| {
        ColchunkError::with_kind(
            ErrorKind::MalformedHeader,
            format!("Uncompressed page size {uncompressed_page_size} smaller than level bytes {levels_len}"),
        )
    })?;

    let values_buf = if header.is_compressed.unwrap_or(true) {
        decompress_page(values_buf, values_size, column.codec, decompressors)?
    } else {
        values_buf.into()
    };

    let values = decode_values(
        header.encoding,
        column.physical_type,
        num_dense,
        &values_buf,
        true,
    )?;

    Ok(DecodedPage {
        definition_levels,
        repetition_levels,
        values,
        dictionary_encoded: header.encoding.is_dictionary(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionCodec;
    use crate::encoding::hybrid_rle::encode_rle;
    use crate::encoding::Encoding;
    use crate::metadata::schema::SchemaElement;
    use crate::types::{PhysicalType, Repetition};
    use crate::value::Value;

    fn schema() -> Schema {
        Schema::new(vec![
            SchemaElement::root("root", 1),
            SchemaElement::leaf("a", PhysicalType::Int32, Repetition::Optional),
        ])
    }

    fn column(codec: CompressionCodec) -> ColumnMetadata {
        ColumnMetadata {
            physical_type: PhysicalType::Int32,
            encodings: Vec::new(),
            path_in_schema: vec!["a".to_string()],
            codec,
            num_values: 0,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
            data_page_offset: 0,
            dictionary_page_offset: None,
        }
    }

    fn header(def_len: usize, is_compressed: Option<bool>) -> DataPageHeaderV2 {
        DataPageHeaderV2 {
            num_values: 3,
            num_nulls: 1,
            num_rows: 3,
            encoding: Encoding::Plain,
            definition_levels_byte_length: def_len,
            repetition_levels_byte_length: 0,
            is_compressed,
        }
    }

    fn values() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&7i32.to_le_bytes());
        buf.extend_from_slice(&9i32.to_le_bytes());
        buf
    }

    #[test]
    fn snappy_values_section() {
        let mut page = Vec::new();
        encode_rle(&[1, 0, 1], 1, &mut page);
        let def_len = page.len();
        let raw_values = values();
        page.extend(snap::raw::Encoder::new().compress_vec(&raw_values).unwrap());

        let decoded = decode_data_page_v2(
            &page,
            def_len + raw_values.len(),
            &header(def_len, None),
            &schema(),
            &column(CompressionCodec::Snappy),
            None,
        )
        .unwrap();

        assert_eq!(vec![1, 0, 1], decoded.definition_levels);
        assert_eq!(vec![Value::Int32(7), Value::Int32(9)], decoded.values);
    }

    #[test]
    fn uncompressed_flag_skips_decompression() {
        let mut page = Vec::new();
        encode_rle(&[1, 0, 1], 1, &mut page);
        let def_len = page.len();
        page.extend(values());

        // Codec says snappy but the page opts out.
        let decoded = decode_data_page_v2(
            &page,
            page.len(),
            &header(def_len, Some(false)),
            &schema(),
            &column(CompressionCodec::Snappy),
            None,
        )
        .unwrap();

        assert_eq!(vec![Value::Int32(7), Value::Int32(9)], decoded.values);
    }

    #[test]
    fn level_lengths_exceed_page() {
        let err = decode_data_page_v2(
            &[0, 1],
            10,
            &header(5, None),
            &schema(),
            &column(CompressionCodec::Uncompressed),
            None,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::InvalidData, err.kind());
    }

    #[test]
    fn more_nulls_than_values() {
        let mut h = header(0, None);
        h.num_nulls = 4;
        let err = decode_data_page_v2(
            &[],
            0,
            &h,
            &Schema::new(vec![
                SchemaElement::root("root", 1),
                SchemaElement::leaf("a", PhysicalType::Int32, Repetition::Required),
            ]),
            &column(CompressionCodec::Uncompressed),
            None,
        )
        .unwrap_err();

        assert_eq!(ErrorKind::InvalidData, err.kind());
    }
}
