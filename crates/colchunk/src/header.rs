//! Page header decoding.
//!
//! Headers are thrift structs in the compact protocol. Reading happens in two
//! steps: the raw struct keeps every field optional exactly as found on disk,
//! then conversion into [`PageHeader`] checks required fields and picks the
//! sub-header for the page type.
use colchunk_error::{ColchunkError, ErrorKind, Result, ResultExt};
use thrift::protocol::{TCompactInputProtocol, TInputProtocol, TType};

use crate::encoding::Encoding;
use crate::page::{
    DataPageHeaderV1, DataPageHeaderV2, DictionaryPageHeader, PageHeader, PageKind, PageType,
};
use crate::thrift_ext::TSerializable;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPageHeader {
    pub page_type: Option<i32>,
    pub uncompressed_page_size: Option<i32>,
    pub compressed_page_size: Option<i32>,
    pub crc: Option<i32>,
    pub data_page_header: Option<RawDataPageHeader>,
    pub dictionary_page_header: Option<RawDictionaryPageHeader>,
    pub data_page_header_v2: Option<RawDataPageHeaderV2>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDataPageHeader {
    pub num_values: Option<i32>,
    pub encoding: Option<i32>,
    pub definition_level_encoding: Option<i32>,
    pub repetition_level_encoding: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDictionaryPageHeader {
    pub num_values: Option<i32>,
    pub encoding: Option<i32>,
    pub is_sorted: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDataPageHeaderV2 {
    pub num_values: Option<i32>,
    pub num_nulls: Option<i32>,
    pub num_rows: Option<i32>,
    pub encoding: Option<i32>,
    pub definition_levels_byte_length: Option<i32>,
    pub repetition_levels_byte_length: Option<i32>,
    pub is_compressed: Option<bool>,
}

/// Decode the page header starting at `offset`.
///
/// Returns the header and the number of bytes it occupies.
pub fn decode_page_header(bytes: &[u8], offset: usize) -> Result<(PageHeader, usize)> {
    let (raw, len) = decode_raw_page_header(bytes, offset)?;
    let header = PageHeader::try_from_raw(raw)?;
    Ok((header, len))
}

pub fn decode_raw_page_header(bytes: &[u8], offset: usize) -> Result<(RawPageHeader, usize)> {
    let buf = match bytes.get(offset..) {
        Some(buf) if !buf.is_empty() => buf,
        _ => {
            return Err(malformed(format!(
                "Page header offset {offset} out of bounds for buffer of length {}",
                bytes.len()
            )))
        }
    };

    let mut reader = buf;
    let raw = {
        let mut input = TCompactInputProtocol::new(&mut reader);
        RawPageHeader::read_from_in_protocol(&mut input)
            .context_kind(ErrorKind::MalformedHeader, "Failed to read page header")?
    };

    Ok((raw, buf.len() - reader.len()))
}

impl PageHeader {
    pub fn try_from_raw(raw: RawPageHeader) -> Result<Self> {
        let compressed_page_size = match raw.compressed_page_size {
            Some(size) => to_usize(size, "compressed_page_size")?,
            None => return Err(malformed("Compressed page size is missing")),
        };
        let uncompressed_page_size = match raw.uncompressed_page_size {
            Some(size) => to_usize(size, "uncompressed_page_size")?,
            None => return Err(malformed("Uncompressed page size is missing")),
        };
        let page_type = match raw.page_type {
            Some(v) => v,
            None => return Err(malformed("Page type is missing")),
        };

        let kind = match PageType::from_thrift(page_type) {
            Some(PageType::DataPage) => {
                let header = raw
                    .data_page_header
                    .ok_or_else(|| malformed("Data page header is missing"))?;
                PageKind::DataV1(header.try_into_header()?)
            }
            Some(PageType::DictionaryPage) => {
                let header = raw
                    .dictionary_page_header
                    .ok_or_else(|| malformed("Dictionary page header is missing"))?;
                PageKind::Dictionary(header.try_into_header()?)
            }
            Some(PageType::DataPageV2) => {
                let header = raw
                    .data_page_header_v2
                    .ok_or_else(|| malformed("Data page header v2 is missing"))?;
                PageKind::DataV2(header.try_into_header()?)
            }
            Some(other) => return Err(malformed(format!("Unsupported page type: {other:?}"))),
            None => return Err(malformed(format!("Unsupported page type: {page_type}"))),
        };

        Ok(PageHeader {
            kind,
            uncompressed_page_size,
            compressed_page_size,
            crc: raw.crc,
        })
    }
}

impl RawDataPageHeader {
    fn try_into_header(self) -> Result<DataPageHeaderV1> {
        Ok(DataPageHeaderV1 {
            num_values: required_usize(self.num_values, "num_values")?,
            encoding: required_encoding(self.encoding, "encoding")?,
            definition_level_encoding: required_encoding(
                self.definition_level_encoding,
                "definition_level_encoding",
            )?,
            repetition_level_encoding: required_encoding(
                self.repetition_level_encoding,
                "repetition_level_encoding",
            )?,
        })
    }
}

impl RawDictionaryPageHeader {
    fn try_into_header(self) -> Result<DictionaryPageHeader> {
        Ok(DictionaryPageHeader {
            num_values: required_usize(self.num_values, "num_values")?,
            encoding: required_encoding(self.encoding, "encoding")?,
            is_sorted: self.is_sorted,
        })
    }
}

impl RawDataPageHeaderV2 {
    fn try_into_header(self) -> Result<DataPageHeaderV2> {
        Ok(DataPageHeaderV2 {
            num_values: required_usize(self.num_values, "num_values")?,
            num_nulls: required_usize(self.num_nulls, "num_nulls")?,
            num_rows: required_usize(self.num_rows, "num_rows")?,
            encoding: required_encoding(self.encoding, "encoding")?,
            definition_levels_byte_length: required_usize(
                self.definition_levels_byte_length,
                "definition_levels_byte_length",
            )?,
            repetition_levels_byte_length: required_usize(
                self.repetition_levels_byte_length,
                "repetition_levels_byte_length",
            )?,
            is_compressed: self.is_compressed,
        })
    }
}

fn malformed(msg: impl Into<String>) -> ColchunkError {
    ColchunkError::with_kind(ErrorKind::MalformedHeader, msg)
}

fn to_usize(v: i32, field: &str) -> Result<usize> {
    usize::try_from(v).map_err(|_| malformed(format!("Negative value {v} for {field}")))
}

fn required_usize(v: Option<i32>, field: &str) -> Result<usize> {
    match v {
        Some(v) => to_usize(v, field),
        None => Err(malformed(format!("Missing field {field}"))),
    }
}

fn required_encoding(v: Option<i32>, field: &str) -> Result<Encoding> {
    match v {
        Some(v) => Encoding::try_from_thrift(v),
        None => Err(malformed(format!("Missing field {field}"))),
    }
}

/// Read fields of a struct, calling `f` with each field id and type.
///
/// Fields `f` doesn't handle must be skipped by it.
fn read_struct<T, F>(i_prot: &mut T, mut f: F) -> thrift::Result<()>
where
    T: TInputProtocol,
    F: FnMut(&mut T, i16, TType) -> thrift::Result<()>,
{
    i_prot.read_struct_begin()?;
    loop {
        let field_ident = i_prot.read_field_begin()?;
        if field_ident.field_type == TType::Stop {
            break;
        }
        match field_ident.id {
            Some(id) => f(i_prot, id, field_ident.field_type)?,
            None => i_prot.skip(field_ident.field_type)?,
        }
        i_prot.read_field_end()?;
    }
    i_prot.read_struct_end()
}

impl TSerializable for RawPageHeader {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        let mut out = RawPageHeader::default();
        read_struct(i_prot, |i_prot, id, field_type| {
            match (id, field_type) {
                (1, TType::I32) => out.page_type = Some(i_prot.read_i32()?),
                (2, TType::I32) => out.uncompressed_page_size = Some(i_prot.read_i32()?),
                (3, TType::I32) => out.compressed_page_size = Some(i_prot.read_i32()?),
                (4, TType::I32) => out.crc = Some(i_prot.read_i32()?),
                (5, TType::Struct) => {
                    out.data_page_header = Some(RawDataPageHeader::read_from_in_protocol(i_prot)?)
                }
                (7, TType::Struct) => {
                    out.dictionary_page_header =
                        Some(RawDictionaryPageHeader::read_from_in_protocol(i_prot)?)
                }
                (8, TType::Struct) => {
                    out.data_page_header_v2 =
                        Some(RawDataPageHeaderV2::read_from_in_protocol(i_prot)?)
                }
                // Index page header (6) and anything unknown.
                (_, other) => i_prot.skip(other)?,
            }
            Ok(())
        })?;
        Ok(out)
    }

    #[cfg(any(test, feature = "testutil"))]
    fn write_to_out_protocol<T: thrift::protocol::TOutputProtocol>(
        &self,
        o_prot: &mut T,
    ) -> thrift::Result<()> {
        use write::*;

        o_prot.write_struct_begin(&thrift::protocol::TStructIdentifier::new("PageHeader"))?;
        write_i32(o_prot, "type", 1, self.page_type)?;
        write_i32(o_prot, "uncompressed_page_size", 2, self.uncompressed_page_size)?;
        write_i32(o_prot, "compressed_page_size", 3, self.compressed_page_size)?;
        write_i32(o_prot, "crc", 4, self.crc)?;
        write_struct(o_prot, "data_page_header", 5, self.data_page_header.as_ref())?;
        write_struct(
            o_prot,
            "dictionary_page_header",
            7,
            self.dictionary_page_header.as_ref(),
        )?;
        write_struct(o_prot, "data_page_header_v2", 8, self.data_page_header_v2.as_ref())?;
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

impl TSerializable for RawDataPageHeader {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        let mut out = RawDataPageHeader::default();
        read_struct(i_prot, |i_prot, id, field_type| {
            match (id, field_type) {
                (1, TType::I32) => out.num_values = Some(i_prot.read_i32()?),
                (2, TType::I32) => out.encoding = Some(i_prot.read_i32()?),
                (3, TType::I32) => out.definition_level_encoding = Some(i_prot.read_i32()?),
                (4, TType::I32) => out.repetition_level_encoding = Some(i_prot.read_i32()?),
                // Statistics (5) and anything unknown.
                (_, other) => i_prot.skip(other)?,
            }
            Ok(())
        })?;
        Ok(out)
    }

    #[cfg(any(test, feature = "testutil"))]
    fn write_to_out_protocol<T: thrift::protocol::TOutputProtocol>(
        &self,
        o_prot: &mut T,
    ) -> thrift::Result<()> {
        use write::*;

        o_prot.write_struct_begin(&thrift::protocol::TStructIdentifier::new("DataPageHeader"))?;
        write_i32(o_prot, "num_values", 1, self.num_values)?;
        write_i32(o_prot, "encoding", 2, self.encoding)?;
        write_i32(o_prot, "definition_level_encoding", 3, self.definition_level_encoding)?;
        write_i32(o_prot, "repetition_level_encoding", 4, self.repetition_level_encoding)?;
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

impl TSerializable for RawDictionaryPageHeader {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        let mut out = RawDictionaryPageHeader::default();
        read_struct(i_prot, |i_prot, id, field_type| {
            match (id, field_type) {
                (1, TType::I32) => out.num_values = Some(i_prot.read_i32()?),
                (2, TType::I32) => out.encoding = Some(i_prot.read_i32()?),
                (3, TType::Bool) => out.is_sorted = Some(i_prot.read_bool()?),
                (_, other) => i_prot.skip(other)?,
            }
            Ok(())
        })?;
        Ok(out)
    }

    #[cfg(any(test, feature = "testutil"))]
    fn write_to_out_protocol<T: thrift::protocol::TOutputProtocol>(
        &self,
        o_prot: &mut T,
    ) -> thrift::Result<()> {
        use write::*;

        o_prot.write_struct_begin(&thrift::protocol::TStructIdentifier::new(
            "DictionaryPageHeader",
        ))?;
        write_i32(o_prot, "num_values", 1, self.num_values)?;
        write_i32(o_prot, "encoding", 2, self.encoding)?;
        write_bool(o_prot, "is_sorted", 3, self.is_sorted)?;
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

impl TSerializable for RawDataPageHeaderV2 {
    fn read_from_in_protocol<T: TInputProtocol>(i_prot: &mut T) -> thrift::Result<Self> {
        let mut out = RawDataPageHeaderV2::default();
        read_struct(i_prot, |i_prot, id, field_type| {
            match (id, field_type) {
                (1, TType::I32) => out.num_values = Some(i_prot.read_i32()?),
                (2, TType::I32) => out.num_nulls = Some(i_prot.read_i32()?),
                (3, TType::I32) => out.num_rows = Some(i_prot.read_i32()?),
                (4, TType::I32) => out.encoding = Some(i_prot.read_i32()?),
                (5, TType::I32) => out.definition_levels_byte_length = Some(i_prot.read_i32()?),
                (6, TType::I32) => out.repetition_levels_byte_length = Some(i_prot.read_i32()?),
                (7, TType::Bool) => out.is_compressed = Some(i_prot.read_bool()?),
                // Statistics (8) and anything unknown.
                (_, other) => i_prot.skip(other)?,
            }
            Ok(())
        })?;
        Ok(out)
    }

    #[cfg(any(test, feature = "testutil"))]
    fn write_to_out_protocol<T: thrift::protocol::TOutputProtocol>(
        &self,
        o_prot: &mut T,
    ) -> thrift::Result<()> {
        use write::*;

        o_prot.write_struct_begin(&thrift::protocol::TStructIdentifier::new(
            "DataPageHeaderV2",
        ))?;
        write_i32(o_prot, "num_values", 1, self.num_values)?;
        write_i32(o_prot, "num_nulls", 2, self.num_nulls)?;
        write_i32(o_prot, "num_rows", 3, self.num_rows)?;
        write_i32(o_prot, "encoding", 4, self.encoding)?;
        write_i32(
            o_prot,
            "definition_levels_byte_length",
            5,
            self.definition_levels_byte_length,
        )?;
        write_i32(
            o_prot,
            "repetition_levels_byte_length",
            6,
            self.repetition_levels_byte_length,
        )?;
        write_bool(o_prot, "is_compressed", 7, self.is_compressed)?;
        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

#[cfg(any(test, feature = "testutil"))]
mod write {
    use thrift::protocol::{TFieldIdentifier, TOutputProtocol, TType};

    use crate::thrift_ext::TSerializable;

    pub fn write_i32<T: TOutputProtocol>(
        o_prot: &mut T,
        name: &str,
        id: i16,
        v: Option<i32>,
    ) -> thrift::Result<()> {
        if let Some(v) = v {
            o_prot.write_field_begin(&TFieldIdentifier::new(name, TType::I32, id))?;
            o_prot.write_i32(v)?;
            o_prot.write_field_end()?;
        }
        Ok(())
    }

    pub fn write_bool<T: TOutputProtocol>(
        o_prot: &mut T,
        name: &str,
        id: i16,
        v: Option<bool>,
    ) -> thrift::Result<()> {
        if let Some(v) = v {
            o_prot.write_field_begin(&TFieldIdentifier::new(name, TType::Bool, id))?;
            o_prot.write_bool(v)?;
            o_prot.write_field_end()?;
        }
        Ok(())
    }

    pub fn write_struct<T: TOutputProtocol, S: TSerializable>(
        o_prot: &mut T,
        name: &str,
        id: i16,
        v: Option<&S>,
    ) -> thrift::Result<()> {
        if let Some(v) = v {
            o_prot.write_field_begin(&TFieldIdentifier::new(name, TType::Struct, id))?;
            v.write_to_out_protocol(o_prot)?;
            o_prot.write_field_end()?;
        }
        Ok(())
    }
}

/// Serialize a raw header with the compact protocol.
#[cfg(any(test, feature = "testutil"))]
pub fn encode_raw_page_header(header: &RawPageHeader) -> Result<Vec<u8>> {
    use thrift::protocol::{TCompactOutputProtocol, TOutputProtocol};

    let mut buf = Vec::new();
    {
        let mut output = TCompactOutputProtocol::new(&mut buf);
        header
            .write_to_out_protocol(&mut output)
            .context("Failed to write page header")?;
        output.flush().context("Failed to flush page header")?;
    }
    Ok(buf)
}
