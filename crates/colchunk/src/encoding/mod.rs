pub mod bitpack;
pub mod delta_binary;
pub mod hybrid_rle;
pub mod plain;
pub mod uleb128;

use colchunk_error::{ColchunkError, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Plain,
    PlainDictionary,
    Rle,
    BitPacked,
    DeltaBinaryPacked,
    DeltaLengthByteArray,
    DeltaByteArray,
    RleDictionary,
    ByteStreamSplit,
}

impl Encoding {
    pub fn try_from_thrift(v: i32) -> Result<Self> {
        Ok(match v {
            0 => Self::Plain,
            2 => Self::PlainDictionary,
            3 => Self::Rle,
            4 => Self::BitPacked,
            5 => Self::DeltaBinaryPacked,
            6 => Self::DeltaLengthByteArray,
            7 => Self::DeltaByteArray,
            8 => Self::RleDictionary,
            9 => Self::ByteStreamSplit,
            other => {
                return Err(ColchunkError::with_kind(
                    ErrorKind::MalformedHeader,
                    format!("Unknown encoding: {other}"),
                ))
            }
        })
    }

    pub const fn to_thrift(self) -> i32 {
        match self {
            Self::Plain => 0,
            Self::PlainDictionary => 2,
            Self::Rle => 3,
            Self::BitPacked => 4,
            Self::DeltaBinaryPacked => 5,
            Self::DeltaLengthByteArray => 6,
            Self::DeltaByteArray => 7,
            Self::RleDictionary => 8,
            Self::ByteStreamSplit => 9,
        }
    }

    /// If values with this encoding are indices into a dictionary.
    pub const fn is_dictionary(self) -> bool {
        matches!(self, Self::PlainDictionary | Self::RleDictionary)
    }
}

/// Number of bits needed to store `max`.
pub fn bit_width(max: u32) -> u8 {
    (32 - max.leading_zeros()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_widths() {
        assert_eq!(0, bit_width(0));
        assert_eq!(1, bit_width(1));
        assert_eq!(2, bit_width(2));
        assert_eq!(2, bit_width(3));
        assert_eq!(3, bit_width(4));
        assert_eq!(32, bit_width(u32::MAX));
    }

    #[test]
    fn thrift_roundtrip_dictionary() {
        let enc = Encoding::try_from_thrift(8).unwrap();
        assert_eq!(Encoding::RleDictionary, enc);
        assert!(enc.is_dictionary());
        assert!(!Encoding::Plain.is_dictionary());
    }

    #[test]
    fn unknown_encoding() {
        let err = Encoding::try_from_thrift(1).unwrap_err();
        assert_eq!(ErrorKind::MalformedHeader, err.kind());
    }
}
