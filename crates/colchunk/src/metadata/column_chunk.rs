//! Column chunk metadata

use colchunk_error::{ColchunkError, ErrorKind, Result};

use crate::compression::CompressionCodec;
use crate::encoding::Encoding;
use crate::types::PhysicalType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub physical_type: PhysicalType,
    pub encodings: Vec<Encoding>,
    pub path_in_schema: Vec<String>,
    pub codec: CompressionCodec,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub data_page_offset: i64,
    pub dictionary_page_offset: Option<i64>,
}

impl ColumnMetadata {
    /// Byte offset of the first page in the column chunk.
    ///
    /// The dictionary page comes first when there is one, but some writers
    /// record a dictionary offset that's past the data page offset. The
    /// lower of the two wins.
    pub fn column_offset(&self) -> Result<usize> {
        let offset = match self.dictionary_page_offset {
            Some(dict) if dict < self.data_page_offset => dict,
            _ => self.data_page_offset,
        };

        usize::try_from(offset).map_err(|_| {
            ColchunkError::with_kind(
                ErrorKind::InvalidData,
                format!(
                    "Negative column offset {offset} for column '{}'",
                    self.path_in_schema.join(".")
                ),
            )
        })
    }

    /// Exclusive end of the column chunk within `buf_len` bytes, given the
    /// chunk starts at `column_offset`.
    pub(crate) fn chunk_end(&self, column_offset: usize, buf_len: usize) -> usize {
        match usize::try_from(self.total_compressed_size) {
            Ok(size) if size > 0 => column_offset.saturating_add(size).min(buf_len),
            _ => buf_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(data: i64, dict: Option<i64>) -> ColumnMetadata {
        ColumnMetadata {
            physical_type: PhysicalType::Int32,
            encodings: vec![Encoding::Plain],
            path_in_schema: vec!["a".to_string()],
            codec: CompressionCodec::Uncompressed,
            num_values: 0,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
            data_page_offset: data,
            dictionary_page_offset: dict,
        }
    }

    #[test]
    fn offset_without_dictionary() {
        assert_eq!(100, meta(100, None).column_offset().unwrap());
    }

    #[test]
    fn offset_dictionary_first() {
        assert_eq!(4, meta(100, Some(4)).column_offset().unwrap());
    }

    #[test]
    fn offset_dictionary_after_data() {
        assert_eq!(100, meta(100, Some(200)).column_offset().unwrap());
    }

    #[test]
    fn offset_equal() {
        assert_eq!(50, meta(50, Some(50)).column_offset().unwrap());
    }

    #[test]
    fn negative_offset() {
        let err = meta(-1, None).column_offset().unwrap_err();
        assert_eq!(ErrorKind::InvalidData, err.kind());
    }

    #[test]
    fn chunk_end_bounded_by_compressed_size() {
        let mut m = meta(0, None);
        assert_eq!(40, m.chunk_end(10, 40));

        m.total_compressed_size = 20;
        assert_eq!(30, m.chunk_end(10, 40));

        m.total_compressed_size = 100;
        assert_eq!(40, m.chunk_end(10, 40));
    }
}
