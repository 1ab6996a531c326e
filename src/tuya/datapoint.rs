use std::fmt;

/// Tuya DP payload type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// [ bytes ]
    Raw = 0,
    /// [ 0/1 ]
    Bool = 1,
    /// [ 4 byte value ]
    Value = 2,
    /// [ N byte string ]
    String = 3,
    /// [ 0-255 ]
    Enum = 4,
    /// [ 1,2,4 bytes ] as bits
    Bitmap = 5,
}

impl DataType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Raw),
            1 => Some(Self::Bool),
            2 => Some(Self::Value),
            3 => Some(Self::String),
            4 => Some(Self::Enum),
            5 => Some(Self::Bitmap),
            _ => None,
        }
    }
}

/// A decoded DP payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DpValue {
    Raw(Vec<u8>),
    Bool(bool),
    Value(u32),
    String(String),
    Enum(u8),
    Bitmap(u32),
}

impl DpValue {
    /// Truthiness as used for the presence capability.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Raw(_) => true,
            Self::Bool(b) => *b,
            Self::Value(n) | Self::Bitmap(n) => *n != 0,
            Self::String(s) => !s.is_empty(),
            Self::Enum(e) => *e != 0,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            Self::Value(n) | Self::Bitmap(n) => Some(f64::from(*n)),
            Self::Enum(e) => Some(f64::from(*e)),
            Self::Raw(_) | Self::String(_) => None,
        }
    }
}

impl fmt::Display for DpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(bytes) => write!(f, "{}", hex::encode(bytes)),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Value(n) | Self::Bitmap(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Enum(e) => write!(f, "{e}"),
        }
    }
}

/// Big-endian unsigned accumulation of a multi-byte payload.
/// Accumulates in 32 bits, so only the last four bytes of a longer payload count.
pub fn be_number(chunks: &[u8]) -> u32 {
    chunks
        .iter()
        .fold(0u32, |value, &b| (value << 8) | u32::from(b))
}

/// Decode a DP payload by its type tag. Returns `None` for unknown tags.
pub fn decode(datatype: u8, data: &[u8]) -> Option<DpValue> {
    let value = match DataType::from_tag(datatype)? {
        DataType::Raw => DpValue::Raw(data.to_vec()),
        DataType::Bool => DpValue::Bool(data.first() == Some(&1)),
        DataType::Value => DpValue::Value(be_number(data)),
        DataType::String => DpValue::String(data.iter().map(|&b| char::from(b)).collect()),
        DataType::Enum => DpValue::Enum(*data.first()?),
        DataType::Bitmap => DpValue::Bitmap(be_number(data)),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_decoder_reconstructs_big_endian() {
        let samples: [u32; 6] = [0, 1, 0xff, 0x1234, 0x00ab_cdef, 0xdead_beef];
        for n in samples {
            let bytes = n.to_be_bytes();
            for len in 1..=4 {
                let tail = &bytes[4 - len..];
                let expected = if len == 4 {
                    n
                } else {
                    n & ((1u32 << (8 * len)) - 1)
                };
                assert_eq!(be_number(tail), expected, "bytes {tail:?}");
            }
        }
    }

    #[test]
    fn value_payload_is_u32() {
        assert_eq!(decode(2, &[0, 0, 1, 44]), Some(DpValue::Value(300)));
        let top_bit = decode(2, &[0x80, 0, 0, 0]);
        assert_eq!(top_bit, Some(DpValue::Value(0x8000_0000)));
    }

    #[test]
    fn long_payload_keeps_last_four_bytes() {
        assert_eq!(be_number(&[0x01, 0x02, 0x03, 0x04, 0x05]), 0x0203_0405);
    }

    #[test]
    fn bool_true_only_for_one() {
        for b in 0..=u8::MAX {
            assert_eq!(decode(1, &[b]), Some(DpValue::Bool(b == 1)));
        }
        assert_eq!(decode(1, &[]), Some(DpValue::Bool(false)));
    }

    #[test]
    fn string_is_bytewise() {
        assert_eq!(decode(3, b"abc"), Some(DpValue::String("abc".to_string())));
        assert_eq!(decode(3, &[0xe9]), Some(DpValue::String("é".to_string())));
    }

    #[test]
    fn enum_raw_and_bitmap() {
        assert_eq!(decode(4, &[2]), Some(DpValue::Enum(2)));
        assert_eq!(decode(4, &[]), None);
        assert_eq!(decode(0, &[1, 2]), Some(DpValue::Raw(vec![1, 2])));
        assert_eq!(decode(5, &[0x01, 0x00]), Some(DpValue::Bitmap(256)));
    }

    #[test]
    fn unknown_tag_decodes_to_nothing() {
        assert_eq!(decode(6, &[1]), None);
        assert_eq!(decode(0xff, &[]), None);
    }

    #[test]
    fn truthiness() {
        assert!(DpValue::Enum(1).is_truthy());
        assert!(!DpValue::Enum(0).is_truthy());
        assert!(!DpValue::Value(0).is_truthy());
        assert!(DpValue::Raw(vec![]).is_truthy());
        assert!(!DpValue::String(String::new()).is_truthy());
    }
}
