use colchunk::compression::{CompressionCodec, Decompressors};
use colchunk::encoding::Encoding;
use colchunk::metadata::column_chunk::ColumnMetadata;
use colchunk::metadata::row_group::RowGroupMetadata;
use colchunk::metadata::schema::{Schema, SchemaElement};
use colchunk::testutil::*;
use colchunk::types::{PhysicalType, Repetition};
use colchunk::{read_column, Value};
use colchunk_error::Result;
use logutil::LogFormat;
use rayon::prelude::*;
use tracing::{info, Level};

const NUM_COLUMNS: usize = 16;
const ROWS_PER_PAGE: usize = 100;
const PAGES_PER_COLUMN: usize = 4;

/// Lay out several int64 columns back to back in one buffer, the way a row
/// group stores them. Column `c` holds `c * 1000 + row`, with every 7th row
/// null.
fn write_row_group() -> Result<(Vec<u8>, Vec<ColumnMetadata>)> {
    let mut file = Vec::new();
    let mut columns = Vec::with_capacity(NUM_COLUMNS);

    for col in 0..NUM_COLUMNS {
        let codec = if col % 2 == 0 {
            CompressionCodec::Snappy
        } else {
            CompressionCodec::Uncompressed
        };
        let mut b = ChunkBuilder::with_buffer(codec, file);

        for page in 0..PAGES_PER_COLUMN {
            let rows = page * ROWS_PER_PAGE..(page + 1) * ROWS_PER_PAGE;
            let def: Vec<i16> = rows.clone().map(|r| (r % 7 != 0) as i16).collect();
            let values: Vec<i64> = rows
                .filter(|r| r % 7 != 0)
                .map(|r| (col * 1000 + r) as i64)
                .collect();

            b.data_page_v1(
                &data_page_v1_body(&[], 0, &def, 1, &plain_int64(&values)),
                ROWS_PER_PAGE,
                Encoding::Plain,
            )?;
        }

        let name = format!("c{col}");
        columns.push(b.column_metadata(&[name.as_str()], PhysicalType::Int64));
        file = b.finish();
    }

    Ok((file, columns))
}

fn schema() -> Schema {
    let mut elements = vec![SchemaElement::root("schema", NUM_COLUMNS)];
    elements.extend((0..NUM_COLUMNS).map(|col| {
        SchemaElement::leaf(format!("c{col}"), PhysicalType::Int64, Repetition::Optional)
    }));
    Schema::new(elements)
}

fn expected(col: usize) -> Vec<Value> {
    (0..ROWS_PER_PAGE * PAGES_PER_COLUMN)
        .map(|r| {
            if r % 7 == 0 {
                Value::Null
            } else {
                Value::Int64((col * 1000 + r) as i64)
            }
        })
        .collect()
}

#[test]
fn decode_columns_in_parallel() {
    // Worker threads log through the global subscriber.
    logutil::configure_global_logger(Level::WARN, LogFormat::Json);

    let (file, columns) = write_row_group().unwrap();
    let schema = schema();
    let row_group = RowGroupMetadata::new((ROWS_PER_PAGE * PAGES_PER_COLUMN) as i64);
    let decompressors = Decompressors::with_builtin();

    let decoded: Vec<Vec<Value>> = columns
        .par_iter()
        .map(|column| {
            read_column(
                &file,
                column.column_offset()?,
                &row_group,
                column,
                &schema,
                Some(&decompressors),
            )
        })
        .collect::<Result<_>>()
        .unwrap();

    info!(columns = decoded.len(), "decoded row group");

    assert_eq!(NUM_COLUMNS, decoded.len());
    for (col, rows) in decoded.iter().enumerate() {
        assert_eq!(&expected(col), rows, "column {col}");
    }
}

#[test]
fn parallel_results_match_sequential() {
    logutil::configure_test_logger();

    let (file, columns) = write_row_group().unwrap();
    let schema = schema();
    let row_group = RowGroupMetadata::new((ROWS_PER_PAGE * PAGES_PER_COLUMN) as i64);

    let decode = |column: &ColumnMetadata| {
        read_column(
            &file,
            column.column_offset().unwrap(),
            &row_group,
            column,
            &schema,
            None,
        )
        .unwrap()
    };

    let sequential: Vec<_> = columns.iter().map(decode).collect();
    let parallel: Vec<_> = columns.par_iter().map(decode).collect();

    assert_eq!(sequential, parallel);
}
