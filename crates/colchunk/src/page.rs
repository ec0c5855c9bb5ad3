use crate::encoding::Encoding;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataPageHeaderV1 {
    pub num_values: usize,
    pub encoding: Encoding,
    pub definition_level_encoding: Encoding,
    pub repetition_level_encoding: Encoding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPageHeaderV2 {
    pub num_values: usize,
    pub num_nulls: usize,
    pub num_rows: usize,
    pub encoding: Encoding,
    pub definition_levels_byte_length: usize,
    pub repetition_levels_byte_length: usize,
    /// If the values section is compressed, true when absent.
    pub is_compressed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPageHeader {
    pub num_values: usize,
    pub encoding: Encoding,
    pub is_sorted: Option<bool>,
}

/// The kind of page along with its type specific header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    Dictionary(DictionaryPageHeader),
    DataV1(DataPageHeaderV1),
    DataV2(DataPageHeaderV2),
}

impl PageKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dictionary(_) => "DICTIONARY_PAGE",
            Self::DataV1(_) => "DATA_PAGE",
            Self::DataV2(_) => "DATA_PAGE_V2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub kind: PageKind,
    pub uncompressed_page_size: usize,
    pub compressed_page_size: usize,
    pub crc: Option<i32>,
}

/// Page type ids as written in the thrift header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    DataPage,
    IndexPage,
    DictionaryPage,
    DataPageV2,
}

impl PageType {
    pub fn from_thrift(v: i32) -> Option<Self> {
        Some(match v {
            0 => Self::DataPage,
            1 => Self::IndexPage,
            2 => Self::DictionaryPage,
            3 => Self::DataPageV2,
            _ => return None,
        })
    }

    pub const fn to_thrift(self) -> i32 {
        match self {
            Self::DataPage => 0,
            Self::IndexPage => 1,
            Self::DictionaryPage => 2,
            Self::DataPageV2 => 3,
        }
    }
}
