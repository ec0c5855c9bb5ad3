pub mod assemble;
pub mod column;
pub mod compression;
pub mod convert;
pub mod datapage;
pub mod datapage_v2;
pub mod dictionary;
pub mod encoding;
pub mod header;
pub mod metadata;
pub mod page;
pub mod types;
pub mod value;

#[cfg(feature = "json")]
pub mod json;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub(crate) mod thrift_ext;

pub use column::{read_column, reconstruct_nulls, ColumnChunkDecoder};
pub use compression::{CompressionCodec, Decompressors};
pub use dictionary::Dictionary;
pub use value::Value;
