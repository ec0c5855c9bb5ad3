use std::fmt::Debug;

/// Physical types representable in parquet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    Required,
    Optional,
    Repeated,
}

/// Parquet converted type, deprecated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertedType {
    Utf8,
    Map,
    MapKeyValue,
    List,
    Enum,
    Decimal,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Json,
    Bson,
    Interval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal {
        scale: i32,
        precision: i32,
    },
    Date,
    Time {
        is_adjusted_to_u_t_c: bool,
        unit: TimeUnit,
    },
    Timestamp {
        is_adjusted_to_u_t_c: bool,
        unit: TimeUnit,
    },
    Integer {
        bit_width: i8,
        is_signed: bool,
    },
    Unknown,
    Json,
    Bson,
    Uuid,
    Float16,
}

/// Parquet Int96 type. Deprecated.
///
/// Stored as nanoseconds within the day (first 8 bytes) followed by the
/// julian day (last 4 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int96(pub [u32; 3]);

/// Julian day of the unix epoch.
const JULIAN_DAY_OF_EPOCH: i64 = 2_440_588;
const NANOS_PER_DAY: i64 = 86_400 * 1_000_000_000;

impl Int96 {
    pub fn nanos_of_day(&self) -> i64 {
        ((self.0[1] as i64) << 32) | self.0[0] as i64
    }

    pub fn julian_day(&self) -> i64 {
        self.0[2] as i64
    }

    /// Nanoseconds since the unix epoch.
    ///
    /// Wraps for dates outside of what an i64 of nanos can hold (roughly
    /// years 1677 through 2262).
    pub fn to_nanos(&self) -> i64 {
        (self.julian_day() - JULIAN_DAY_OF_EPOCH)
            .wrapping_mul(NANOS_PER_DAY)
            .wrapping_add(self.nanos_of_day())
    }
}

/// Fixed width types that can be plain decoded from little endian bytes.
pub trait ParquetFixedWidthType: Debug + Send + Sync + Copy + 'static {
    const PHYSICAL_TYPE: PhysicalType;
    const WIDTH: usize;

    /// Convert little endian bytes to self.
    ///
    /// `bytes` must be exactly `WIDTH` long.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_fixed_width {
    ($prim:ty, $phys:expr, $width:expr) => {
        impl ParquetFixedWidthType for $prim {
            const PHYSICAL_TYPE: PhysicalType = $phys;
            const WIDTH: usize = $width;

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut buf = [0; $width];
                buf.copy_from_slice(bytes);
                <$prim>::from_le_bytes(buf)
            }
        }
    };
}

impl_fixed_width!(i32, PhysicalType::Int32, 4);
impl_fixed_width!(i64, PhysicalType::Int64, 8);
impl_fixed_width!(f32, PhysicalType::Float, 4);
impl_fixed_width!(f64, PhysicalType::Double, 8);

impl ParquetFixedWidthType for Int96 {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Int96;
    const WIDTH: usize = 12;

    fn from_le_slice(bytes: &[u8]) -> Self {
        let a = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let b = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let c = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        Int96([a, b, c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int96_epoch() {
        let v = Int96([0, 0, JULIAN_DAY_OF_EPOCH as u32]);
        assert_eq!(0, v.to_nanos());
    }

    #[test]
    fn int96_from_bytes() {
        // 1 second into 1970-01-02.
        let nanos: u64 = 1_000_000_000;
        let mut buf = Vec::new();
        buf.extend_from_slice(&nanos.to_le_bytes());
        buf.extend_from_slice(&((JULIAN_DAY_OF_EPOCH + 1) as u32).to_le_bytes());

        let v = Int96::from_le_slice(&buf);
        assert_eq!(NANOS_PER_DAY + 1_000_000_000, v.to_nanos());
    }
}
