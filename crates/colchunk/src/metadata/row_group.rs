//! Row group metadata.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroupMetadata {
    /// Number of rows in the row group. Every column chunk in the row group
    /// must decode to exactly this many values.
    pub num_rows: i64,
    pub total_byte_size: i64,
    /// Offset from beginning of file.
    pub file_offset: Option<i64>,
    /// Row group ordinal in the file.
    pub ordinal: Option<i16>,
}

impl RowGroupMetadata {
    pub fn new(num_rows: i64) -> Self {
        RowGroupMetadata {
            num_rows,
            total_byte_size: 0,
            file_offset: None,
            ordinal: None,
        }
    }
}
