//! Wire type tags and length/count tag encoding.
//!
//! Every length or element count on the wire is a varint carrying the count
//! in bits 2.. and the element scheme in bits 0-1:
//!
//! ```text
//! ┌──────────────────────────────┬──────────┐
//! │ count / byte length          │ scheme   │
//! │ bits 2..63                   │ bits 0-1 │
//! └──────────────────────────────┴──────────┘
//! ```
//!
//! Byte spans (strings, blobs, nested objects, envelopes) always use the
//! `List` scheme with a byte length.

use std::fmt;

use super::varint::size_of_var_unsigned;
use crate::error::{CodecError, Result};

/// Mask selecting the wire type tag of a field set header or length tag.
pub const TYPE_MASK: u64 = 0b11;

/// Field set header bit signalling that a continuation index follows.
pub const CONTINUATION_FLAG: u64 = 0b100;

/// Bit position of the first presence flag in a field set header.
pub const FIRST_FIELD_BIT: u32 = 3;

/// Presence flags available in one segment (bits 3..=63).
pub const FIELDS_PER_SEGMENT: u32 = 64 - FIRST_FIELD_BIT;

/// Longest legal varint encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;

/// The four wire types. The tag values are fixed by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireType {
    /// Length-delimited: strings, blobs, nested structures, collections.
    List,
    /// Zigzag varint: bool, byte, short, int, long.
    Varint,
    /// Four raw bytes: float.
    FourByte,
    /// Eight raw bytes: double, timestamps.
    EightByte,
}

impl WireType {
    /// All wire types in tag order.
    pub const ALL: [WireType; 4] = [
        WireType::List,
        WireType::Varint,
        WireType::FourByte,
        WireType::EightByte,
    ];

    /// The 2-bit tag for this wire type.
    #[inline]
    pub const fn tag(self) -> u8 {
        match self {
            WireType::List => 0,
            WireType::Varint => 1,
            WireType::FourByte => 2,
            WireType::EightByte => 3,
        }
    }

    /// Extract the wire type from the low two bits of a header or length tag.
    ///
    /// Total: every 2-bit value names a wire type.
    #[inline]
    pub const fn from_tag(bits: u64) -> Self {
        match bits & TYPE_MASK {
            0 => WireType::List,
            1 => WireType::Varint,
            2 => WireType::FourByte,
            _ => WireType::EightByte,
        }
    }

    /// Encoded width of one value, if fixed.
    #[inline]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            WireType::FourByte => Some(4),
            WireType::EightByte => Some(8),
            WireType::List | WireType::Varint => None,
        }
    }

    /// Smallest possible encoding of one element (used to bound decoded counts).
    #[inline]
    pub const fn min_element_size(self) -> usize {
        match self {
            WireType::FourByte => 4,
            WireType::EightByte => 8,
            WireType::List | WireType::Varint => 1,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::List => "list",
            WireType::Varint => "varint",
            WireType::FourByte => "four-byte",
            WireType::EightByte => "eight-byte",
        };
        f.write_str(name)
    }
}

/// Encode a count with its element scheme.
#[inline]
pub fn encode_list_length(count: usize, scheme: WireType) -> u64 {
    ((count as u64) << 2) | u64::from(scheme.tag())
}

/// Encode a byte length (strings, blobs, nested objects, envelopes).
#[inline]
pub fn encode_byte_list_length(len: usize) -> u64 {
    encode_list_length(len, WireType::List)
}

/// Strip the scheme bits from a length tag without checking them.
#[inline]
pub fn decode_element_count(tag: u64) -> u64 {
    tag >> 2
}

/// Decode a length tag, checking that it was written with `expected`.
pub fn decode_list_length_checked(tag: u64, expected: WireType) -> Result<usize> {
    let found = WireType::from_tag(tag);
    if found != expected {
        return Err(CodecError::CountSchemeMismatch { expected, found });
    }
    // Saturate on narrow targets; callers bound the count against the buffer.
    Ok(usize::try_from(decode_element_count(tag)).unwrap_or(usize::MAX))
}

/// Bytes taken by a length tag for `count` elements.
#[inline]
pub fn list_length_encoded_size(count: usize, scheme: WireType) -> usize {
    size_of_var_unsigned(encode_list_length(count, scheme))
}

/// Bytes taken by a length-prefixed span of `len` bytes, prefix included.
#[inline]
pub fn byte_list_encoded_size(len: usize) -> usize {
    list_length_encoded_size(len, WireType::List) + len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_fixed() {
        assert_eq!(WireType::List.tag(), 0);
        assert_eq!(WireType::Varint.tag(), 1);
        assert_eq!(WireType::FourByte.tag(), 2);
        assert_eq!(WireType::EightByte.tag(), 3);
    }

    #[test]
    fn test_from_tag_ignores_high_bits() {
        for wire_type in WireType::ALL {
            let header = 0b1111_1000 | CONTINUATION_FLAG | u64::from(wire_type.tag());
            assert_eq!(WireType::from_tag(header), wire_type);
        }
    }

    #[test]
    fn test_list_length_layout() {
        assert_eq!(encode_byte_list_length(0), 0);
        assert_eq!(encode_byte_list_length(5), 20);
        assert_eq!(encode_list_length(3, WireType::EightByte), 0b1111);
        assert_eq!(decode_element_count(0b1111), 3);
    }

    #[test]
    fn test_checked_decode_accepts_matching_scheme() {
        let tag = encode_list_length(42, WireType::Varint);
        assert_eq!(decode_list_length_checked(tag, WireType::Varint).unwrap(), 42);
    }

    #[test]
    fn test_checked_decode_rejects_other_scheme() {
        let tag = encode_list_length(42, WireType::FourByte);
        let err = decode_list_length_checked(tag, WireType::EightByte).unwrap_err();
        assert_eq!(
            err,
            CodecError::CountSchemeMismatch {
                expected: WireType::EightByte,
                found: WireType::FourByte,
            }
        );
    }

    #[test]
    fn test_byte_list_encoded_size() {
        // 31 bytes -> tag 124 fits one varint byte
        assert_eq!(byte_list_encoded_size(31), 32);
        // 32 bytes -> tag 128 needs two
        assert_eq!(byte_list_encoded_size(32), 34);
        assert_eq!(byte_list_encoded_size(0), 1);
    }

    #[test]
    fn test_segment_capacity() {
        assert_eq!(FIELDS_PER_SEGMENT, 61);
    }
}
