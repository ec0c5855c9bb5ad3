//! Data page (v1) and dictionary page body decoding.
use colchunk_error::{not_implemented, ColchunkError, ErrorKind, Result};

use crate::dictionary::Dictionary;
use crate::encoding::delta_binary::DeltaBinaryDecoder;
use crate::encoding::hybrid_rle::{decode_levels, HybridRleDecoder};
use crate::encoding::plain::plain_decode_values;
use crate::encoding::Encoding;
use crate::metadata::column_chunk::ColumnMetadata;
use crate::metadata::schema::Schema;
use crate::page::{DataPageHeaderV1, DictionaryPageHeader};
use crate::types::PhysicalType;
use crate::value::Value;

/// Levels and dense values decoded from a data page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedPage {
    /// Empty when the column has no definition levels, or when a flat column
    /// has no nulls in this page.
    pub definition_levels: Vec<i16>,
    /// Empty for non-repeated columns.
    pub repetition_levels: Vec<i16>,
    /// Non-null values only. Dictionary indices are `Value::Int32` slots.
    pub values: Vec<Value>,
    /// If `values` hold dictionary indices.
    pub dictionary_encoded: bool,
}

/// Decode the body of a decompressed v1 data page.
pub fn decode_data_page_v1(
    page: &[u8],
    header: &DataPageHeaderV1,
    schema: &Schema,
    column: &ColumnMetadata,
) -> Result<DecodedPage> {
    let path = &column.path_in_schema;
    let max_rep = schema.max_repetition_level(path)?;
    let max_def = schema.max_definition_level(path)?;
    let num_values = header.num_values;

    let mut buf = page;

    let repetition_levels = if max_rep > 0 {
        check_level_encoding(header.repetition_level_encoding)?;
        let (levels, rest) = read_prefixed(buf)?;
        buf = rest;
        decode_levels(levels, max_rep, num_values)?.0
    } else {
        Vec::new()
    };

    let mut definition_levels = if max_def > 0 {
        check_level_encoding(header.definition_level_encoding)?;
        let (levels, rest) = read_prefixed(buf)?;
        buf = rest;
        decode_levels(levels, max_def, num_values)?.0
    } else {
        Vec::new()
    };

    let num_dense = if definition_levels.is_empty() {
        num_values
    } else {
        definition_levels.iter().filter(|&&d| d == max_def).count()
    };

    if max_rep == 0 && num_dense == definition_levels.len() {
        definition_levels.clear();
    }

    let values = decode_values(header.encoding, column.physical_type, num_dense, buf, true)?;

    Ok(DecodedPage {
        definition_levels,
        repetition_levels,
        values,
        dictionary_encoded: header.encoding.is_dictionary(),
    })
}

/// Decode the body of a decompressed dictionary page.
pub fn decode_dictionary_page(
    page: &[u8],
    header: &DictionaryPageHeader,
    column: &ColumnMetadata,
) -> Result<Dictionary> {
    match header.encoding {
        // Older writers mark the dictionary page itself as PLAIN_DICTIONARY.
        Encoding::Plain | Encoding::PlainDictionary => (),
        other => not_implemented!("dictionary page encoding {other:?}"),
    }

    let values = plain_decode_values(column.physical_type, header.num_values, page)?;
    Ok(Dictionary::new(values))
}

/// Decode `num_values` dense values.
///
/// `rle_length_prefix` controls if RLE encoded booleans start with a 4 byte
/// length.
pub(crate) fn decode_values(
    encoding: Encoding,
    physical_type: PhysicalType,
    num_values: usize,
    buf: &[u8],
    rle_length_prefix: bool,
) -> Result<Vec<Value>> {
    match encoding {
        Encoding::Plain => plain_decode_values(physical_type, num_values, buf),
        Encoding::PlainDictionary | Encoding::RleDictionary => {
            decode_dictionary_indices(num_values, buf)
        }
        Encoding::Rle if physical_type == PhysicalType::Boolean => {
            let buf = if rle_length_prefix {
                read_prefixed(buf)?.0
            } else {
                buf
            };
            let mut out = Vec::new();
            HybridRleDecoder::new(buf, 1).decode(num_values, &mut out)?;
            Ok(out.into_iter().map(|v| Value::Boolean(v != 0)).collect())
        }
        Encoding::DeltaBinaryPacked
            if matches!(physical_type, PhysicalType::Int32 | PhysicalType::Int64) =>
        {
            let mut decoder = DeltaBinaryDecoder::try_new(buf)?;
            if decoder.total_values() < num_values {
                return Err(ColchunkError::with_kind(
                    ErrorKind::InvalidData,
                    format!(
                        "Delta encoded page holds {} values, expected {num_values}",
                        decoder.total_values()
                    ),
                ));
            }

            let mut out = Vec::new();
            decoder.decode_values(num_values, &mut out)?;

            Ok(if physical_type == PhysicalType::Int32 {
                out.into_iter().map(|v| Value::Int32(v as i32)).collect()
            } else {
                out.into_iter().map(Value::Int64).collect()
            })
        }
        other => not_implemented!("{other:?} encoding for {physical_type:?} values"),
    }
}

/// Decode dictionary indices, a bit width byte followed by hybrid encoded
/// values.
fn decode_dictionary_indices(num_values: usize, buf: &[u8]) -> Result<Vec<Value>> {
    if num_values == 0 {
        return Ok(Vec::new());
    }

    let (&bit_width, rest) = buf.split_first().ok_or_else(|| {
        ColchunkError::with_kind(ErrorKind::InvalidData, "Missing dictionary index bit width")
    })?;

    let mut indices = Vec::new();
    HybridRleDecoder::new(rest, bit_width).decode(num_values, &mut indices)?;

    indices
        .into_iter()
        .map(|idx| {
            i32::try_from(idx).map(Value::Int32).map_err(|_| {
                ColchunkError::with_kind(
                    ErrorKind::InvalidData,
                    format!("Dictionary index {idx} too large"),
                )
            })
        })
        .collect()
}

/// Split off a section prefixed with its u32 little endian length.
fn read_prefixed(buf: &[u8]) -> Result<(&[u8], &[u8])> {
    if buf.len() < 4 {
        return Err(ColchunkError::with_kind(
            ErrorKind::InvalidData,
            "Missing length prefix",
        ));
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let rest = &buf[4..];
    if rest.len() < len {
        return Err(ColchunkError::with_kind(
            ErrorKind::InvalidData,
            format!("Length prefix {len} exceeds remaining {} bytes", rest.len()),
        ));
    }

    Ok(rest.split_at(len))
}

fn check_level_encoding(encoding: Encoding) -> Result<()> {
    match encoding {
        Encoding::Rle => Ok(()),
        other => not_implemented!("{other:?} level encoding"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionCodec;
    use crate::encoding::hybrid_rle::{encode_bitpacked, encode_rle};
    use crate::metadata::schema::SchemaElement;
    use crate::types::Repetition;

    fn column(name: &str, physical_type: PhysicalType) -> ColumnMetadata {
        ColumnMetadata {
            physical_type,
            encodings: Vec::new(),
            path_in_schema: vec![name.to_string()],
            codec: CompressionCodec::Uncompressed,
            num_values: 0,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
            data_page_offset: 0,
            dictionary_page_offset: None,
        }
    }

    fn schema(repetition: Repetition, physical_type: PhysicalType) -> Schema {
        Schema::new(vec![
            SchemaElement::root("root", 1),
            SchemaElement::leaf("a", physical_type, repetition),
        ])
    }

    fn header(num_values: usize, encoding: Encoding) -> DataPageHeaderV1 {
        DataPageHeaderV1 {
            num_values,
            encoding,
            definition_level_encoding: Encoding::Rle,
            repetition_level_encoding: Encoding::Rle,
        }
    }

    fn prefixed(section: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(&(section.len() as u32).to_le_bytes());
        out.extend_from_slice(section);
    }

    #[test]
    fn required_plain_int32() {
        let mut page = Vec::new();
        for v in [1i32, -2, 3] {
            page.extend_from_slice(&v.to_le_bytes());
        }

        let decoded = decode_data_page_v1(
            &page,
            &header(3, Encoding::Plain),
            &schema(Repetition::Required, PhysicalType::Int32),
            &column("a", PhysicalType::Int32),
        )
        .unwrap();

        assert!(decoded.definition_levels.is_empty());
        assert!(decoded.repetition_levels.is_empty());
        assert!(!decoded.dictionary_encoded);
        assert_eq!(
            vec![Value::Int32(1), Value::Int32(-2), Value::Int32(3)],
            decoded.values
        );
    }

    #[test]
    fn optional_with_nulls() {
        let mut levels = Vec::new();
        encode_rle(&[1, 0, 1, 1], 1, &mut levels);
        let mut page = Vec::new();
        prefixed(&levels, &mut page);
        for v in [10i64, 20, 30] {
            page.extend_from_slice(&v.to_le_bytes());
        }

        let decoded = decode_data_page_v1(
            &page,
            &header(4, Encoding::Plain),
            &schema(Repetition::Optional, PhysicalType::Int64),
            &column("a", PhysicalType::Int64),
        )
        .unwrap();

        assert_eq!(vec![1, 0, 1, 1], decoded.definition_levels);
        assert_eq!(
            vec![Value::Int64(10), Value::Int64(20), Value::Int64(30)],
            decoded.values
        );
    }

    #[test]
    fn optional_without_nulls_drops_levels() {
        let mut levels = Vec::new();
        encode_rle(&[1, 1], 1, &mut levels);
        let mut page = Vec::new();
        prefixed(&levels, &mut page);
        page.extend_from_slice(&5i32.to_le_bytes());
        page.extend_from_slice(&6i32.to_le_bytes());

        let decoded = decode_data_page_v1(
            &page,
            &header(2, Encoding::Plain),
            &schema(Repetition::Optional, PhysicalType::Int32),
            &column("a", PhysicalType::Int32),
        )
        .unwrap();

        assert!(decoded.definition_levels.is_empty());
        assert_eq!(vec![Value::Int32(5), Value::Int32(6)], decoded.values);
    }

    #[test]
    fn dictionary_indices() {
        let mut page = vec![2];
        encode_bitpacked(&[0, 3, 1, 2], 2, &mut page);

        let decoded = decode_data_page_v1(
            &page,
            &header(4, Encoding::RleDictionary),
            &schema(Repetition::Required, PhysicalType::ByteArray),
            &column("a", PhysicalType::ByteArray),
        )
        .unwrap();

        assert!(decoded.dictionary_encoded);
        assert_eq!(
            vec![Value::Int32(0), Value::Int32(3), Value::Int32(1), Value::Int32(2)],
            decoded.values
        );
    }

    #[test]
    fn rle_booleans() {
        let mut runs = Vec::new();
        encode_rle(&[1, 1, 0], 1, &mut runs);
        let mut page = Vec::new();
        prefixed(&runs, &mut page);

        let decoded = decode_data_page_v1(
            &page,
            &header(3, Encoding::Rle),
            &schema(Repetition::Required, PhysicalType::Boolean),
            &column("a", PhysicalType::Boolean),
        )
        .unwrap();

        assert_eq!(
            vec![Value::Boolean(true), Value::Boolean(true), Value::Boolean(false)],
            decoded.values
        );
    }

    #[test]
    fn unsupported_encoding() {
        let err = decode_data_page_v1(
            &[0; 8],
            &header(2, Encoding::ByteStreamSplit),
            &schema(Repetition::Required, PhysicalType::Float),
            &column("a", PhysicalType::Float),
        )
        .unwrap_err();

        assert_eq!(ErrorKind::NotImplemented, err.kind());
    }

    #[test]
    fn truncated_level_prefix() {
        let err = decode_data_page_v1(
            &[8, 0, 0, 0, 1],
            &header(2, Encoding::Plain),
            &schema(Repetition::Optional, PhysicalType::Int32),
            &column("a", PhysicalType::Int32),
        )
        .unwrap_err();

        assert_eq!(ErrorKind::InvalidData, err.kind());
    }

    #[test]
    fn dictionary_page() {
        let mut page = Vec::new();
        for s in ["x", "yz"] {
            page.extend_from_slice(&(s.len() as u32).to_le_bytes());
            page.extend_from_slice(s.as_bytes());
        }

        let header = DictionaryPageHeader {
            num_values: 2,
            encoding: Encoding::PlainDictionary,
            is_sorted: None,
        };
        let dict =
            decode_dictionary_page(&page, &header, &column("a", PhysicalType::ByteArray)).unwrap();

        assert_eq!(2, dict.len());
        assert_eq!(
            &Value::Bytes(b"yz".to_vec()),
            dict.lookup(&Value::Int32(1)).unwrap()
        );
    }
}
