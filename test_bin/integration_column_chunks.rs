use std::io::Write;

use colchunk::compression::{CompressionCodec, Decompressors};
use colchunk::encoding::Encoding;
use colchunk::header::{RawDataPageHeader, RawPageHeader};
use colchunk::json::rows_to_json;
use colchunk::metadata::row_group::RowGroupMetadata;
use colchunk::metadata::schema::{Schema, SchemaElement};
use colchunk::page::PageType;
use colchunk::testutil::*;
use colchunk::types::{ConvertedType, PhysicalType, Repetition};
use colchunk::{read_column, Value};
use colchunk_error::ErrorKind;
use serde_json::json;

fn schema(leaf: SchemaElement) -> Schema {
    Schema::new(vec![SchemaElement::root("schema", 1), leaf])
}

fn decode(
    builder: ChunkBuilder,
    num_rows: i64,
    schema: &Schema,
    path: &[&str],
    physical_type: PhysicalType,
    decompressors: Option<&Decompressors>,
) -> colchunk_error::Result<Vec<Value>> {
    let column = builder.column_metadata(path, physical_type);
    let bytes = builder.finish();
    read_column(
        &bytes,
        column.column_offset()?,
        &RowGroupMetadata::new(num_rows),
        &column,
        schema,
        decompressors,
    )
}

#[test]
fn mixed_page_versions_share_dictionary() {
    logutil::configure_test_logger();

    let schema = schema(
        SchemaElement::leaf("name", PhysicalType::ByteArray, Repetition::Optional)
            .with_converted_type(ConvertedType::Utf8),
    );

    // Some filler ahead of the chunk, as if other columns came first.
    let mut b = ChunkBuilder::with_prefix(CompressionCodec::Snappy, 17);
    b.dictionary_page(&plain_byte_array(&[b"apple", b"pear"]), 2)
        .unwrap();
    b.data_page_v1(
        &data_page_v1_body(&[], 0, &[1, 0, 1], 1, &encode_dictionary_indices(&[0, 1])),
        3,
        Encoding::RleDictionary,
    )
    .unwrap();
    b.data_page_v2(DataPageV2 {
        definition_levels: encode_levels(&[0, 1], 1),
        values: encode_dictionary_indices(&[1]),
        num_values: 2,
        num_nulls: 1,
        num_rows: 2,
        encoding: Encoding::RleDictionary,
        ..Default::default()
    })
    .unwrap();
    // Writers fall back to plain once the dictionary gets too large.
    b.data_page_v1(
        &data_page_v1_body(&[], 0, &[1, 1], 1, &plain_byte_array(&[b"kiwi", b"fig"])),
        2,
        Encoding::Plain,
    )
    .unwrap();

    let rows = decode(b, 7, &schema, &["name"], PhysicalType::ByteArray, None).unwrap();

    assert_eq!(
        vec![
            Value::from("apple"),
            Value::Null,
            Value::from("pear"),
            Value::Null,
            Value::from("pear"),
            // Null reconstruction only decodes dictionary values as text.
            Value::Bytes(b"kiwi".to_vec()),
            Value::Bytes(b"fig".to_vec()),
        ],
        rows
    );
}

/// A single plain int64 page written with an already compressed body.
fn compressed_int64_page(
    codec: CompressionCodec,
    values: &[u8],
    compressed: &[u8],
    num_values: usize,
) -> ChunkBuilder {
    let header = RawPageHeader {
        page_type: Some(PageType::DataPage.to_thrift()),
        uncompressed_page_size: Some(values.len() as i32),
        compressed_page_size: Some(compressed.len() as i32),
        data_page_header: Some(RawDataPageHeader {
            num_values: Some(num_values as i32),
            encoding: Some(Encoding::Plain.to_thrift()),
            definition_level_encoding: Some(Encoding::Rle.to_thrift()),
            repetition_level_encoding: Some(Encoding::Rle.to_thrift()),
        }),
        ..Default::default()
    };

    let mut b = ChunkBuilder::new(codec);
    b.raw_page(&header, compressed).unwrap();
    b
}

#[test]
fn builtin_codecs() {
    logutil::configure_test_logger();

    let rows: Vec<i64> = (0..1000).map(|v| v % 17 - 8).collect();
    let values = plain_int64(&rows);

    let zstd_body = zstd::bulk::compress(&values, 3).unwrap();
    let lz4_body = lz4_flex::block::compress(&values);
    let mut brotli_body = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut brotli_body, 4096, 5, 22);
        writer.write_all(&values).unwrap();
    }

    let schema = schema(SchemaElement::leaf(
        "v",
        PhysicalType::Int64,
        Repetition::Required,
    ));
    let decompressors = Decompressors::with_builtin();
    let expected: Vec<Value> = rows.iter().copied().map(Value::Int64).collect();

    for (codec, compressed) in [
        (CompressionCodec::Zstd, zstd_body),
        (CompressionCodec::Lz4Raw, lz4_body),
        (CompressionCodec::Brotli, brotli_body),
    ] {
        let b = compressed_int64_page(codec, &values, &compressed, rows.len());
        let decoded = decode(
            b,
            rows.len() as i64,
            &schema,
            &["v"],
            PhysicalType::Int64,
            Some(&decompressors),
        )
        .unwrap();
        assert_eq!(expected, decoded, "{codec}");
    }
}

#[test]
fn gzip_with_builtin_decompressors() {
    logutil::configure_test_logger();

    let values = plain_int64(&[i64::MIN, 0, i64::MAX]);
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&values).unwrap();
    let compressed = encoder.finish().unwrap();

    let schema = schema(SchemaElement::leaf(
        "v",
        PhysicalType::Int64,
        Repetition::Required,
    ));

    let b = compressed_int64_page(CompressionCodec::Gzip, &values, &compressed, 3);

    let err = decode(b.clone(), 3, &schema, &["v"], PhysicalType::Int64, None).unwrap_err();
    assert_eq!(ErrorKind::UnsupportedCodec, err.kind());

    let decompressors = Decompressors::with_builtin();
    let rows = decode(
        b,
        3,
        &schema,
        &["v"],
        PhysicalType::Int64,
        Some(&decompressors),
    )
    .unwrap();

    assert_eq!(
        vec![Value::Int64(i64::MIN), Value::Int64(0), Value::Int64(i64::MAX)],
        rows
    );
}

#[test]
fn nested_list_v2_to_json() {
    logutil::configure_test_logger();

    let schema = Schema::new(vec![
        SchemaElement::root("schema", 1),
        SchemaElement::group("numbers", Repetition::Optional, 1)
            .with_converted_type(ConvertedType::List),
        SchemaElement::group("list", Repetition::Repeated, 1),
        SchemaElement::leaf("element", PhysicalType::Int32, Repetition::Optional),
    ]);

    // [[1, 2], null, [], [null]]
    let mut b = ChunkBuilder::new(CompressionCodec::Snappy);
    b.data_page_v2(DataPageV2 {
        repetition_levels: encode_levels(&[0, 1, 0, 0, 0], 1),
        definition_levels: encode_levels(&[3, 3, 0, 1, 2], 3),
        values: plain_int32(&[1, 2]),
        num_values: 5,
        num_nulls: 3,
        num_rows: 4,
        encoding: Encoding::Plain,
    })
    .unwrap();

    let rows = decode(
        b,
        4,
        &schema,
        &["numbers", "list", "element"],
        PhysicalType::Int32,
        None,
    )
    .unwrap();

    assert_eq!(json!([[1, 2], null, [], [null]]), rows_to_json(&rows));
}

#[test]
fn dates_converted_on_flat_pages() {
    logutil::configure_test_logger();

    let schema = schema(
        SchemaElement::leaf("day", PhysicalType::Int32, Repetition::Required)
            .with_converted_type(ConvertedType::Date),
    );

    let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
    b.data_page_v1(&plain_int32(&[19_723, 0]), 2, Encoding::Plain)
        .unwrap();

    let rows = decode(b, 2, &schema, &["day"], PhysicalType::Int32, None).unwrap();

    assert_eq!(json!(["2024-01-01", "1970-01-01"]), rows_to_json(&rows));
}

#[test]
fn truncated_file_is_an_error() {
    logutil::configure_test_logger();

    let schema = schema(SchemaElement::leaf(
        "v",
        PhysicalType::Int32,
        Repetition::Required,
    ));

    let mut b = ChunkBuilder::new(CompressionCodec::Uncompressed);
    b.data_page_v1(&plain_int32(&[1, 2, 3, 4]), 4, Encoding::Plain)
        .unwrap();
    let column = b.column_metadata(&["v"], PhysicalType::Int32);
    let mut bytes = b.finish();
    bytes.truncate(bytes.len() - 3);

    let err = read_column(
        &bytes,
        0,
        &RowGroupMetadata::new(4),
        &column,
        &schema,
        None,
    )
    .unwrap_err();

    assert_eq!(ErrorKind::MalformedHeader, err.kind());
}
