//! Buffer reader for the wire codec.
//!
//! Reads from a `bytes::Bytes` so that blobs, strings and nested objects can
//! be sliced out without copying: a slice shares the source allocation and
//! keeps it alive for as long as it is held.

use bytes::Bytes;

use super::constants::{decode_list_length_checked, WireType};
use super::text::Text;
use super::varint::{try_decode_var_unsigned, zigzag_decode};
use crate::config::{CodecConfig, DEFAULT_MAX_PAYLOAD_SIZE};
use crate::error::{CodecError, Result};

/// Cursor over an encoded buffer with typed read operations.
#[derive(Debug, Clone)]
pub struct Deserializer {
    buf: Bytes,
    pos: usize,
    max_payload_size: usize,
}

impl Deserializer {
    /// Create a deserializer over `buf` with default limits.
    pub fn new(buf: Bytes) -> Self {
        Self {
            buf,
            pos: 0,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }

    /// Create a deserializer with custom limits.
    pub fn with_config(buf: Bytes, config: &CodecConfig) -> Self {
        Self {
            buf,
            pos: 0,
            max_payload_size: config.max_payload_size,
        }
    }

    /// Create a deserializer over a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Current read offset from the start of the buffer.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Check if the whole buffer has been consumed.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Fail unless the whole buffer has been consumed.
    pub fn done(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    #[inline]
    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::BufferUnderrun { needed, remaining });
        }
        Ok(())
    }

    #[inline]
    fn check_limit(&self, size: usize) -> Result<()> {
        if size > self.max_payload_size {
            return Err(CodecError::PayloadTooLarge {
                size,
                max: self.max_payload_size,
            });
        }
        Ok(())
    }

    /// Read a plain varint.
    pub fn read_var_unsigned(&mut self) -> Result<u64> {
        match try_decode_var_unsigned(&self.buf[self.pos..])? {
            Some((value, consumed)) => {
                self.pos += consumed;
                Ok(value)
            }
            None => Err(CodecError::BufferUnderrun {
                needed: self.remaining() + 1,
                remaining: self.remaining(),
            }),
        }
    }

    /// Read a plain varint that must fit in 32 bits (continuation indices).
    pub fn read_var_u32(&mut self) -> Result<u32> {
        let value = self.read_var_unsigned()?;
        u32::try_from(value).map_err(|_| CodecError::MalformedVarint(super::MAX_VARINT_LEN))
    }

    /// Read a zigzag varint.
    #[inline]
    pub fn read_var_signed(&mut self) -> Result<i64> {
        Ok(zigzag_decode(self.read_var_unsigned()?))
    }

    /// Read a zigzag varint narrowed to `i32`.
    #[inline]
    pub fn read_var_i32(&mut self) -> Result<i32> {
        let value = self.read_var_signed()?;
        i32::try_from(value).map_err(|_| CodecError::VarintOutOfRange {
            value,
            target: "i32",
        })
    }

    /// Read a boolean (any non-zero value is `true`).
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_var_signed()? != 0)
    }

    /// Read four raw bytes as an `f32`.
    pub fn read_fixed4(&mut self) -> Result<f32> {
        self.ensure(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(f32::from_le_bytes(raw))
    }

    /// Read eight raw bytes as an `f64`.
    pub fn read_fixed8(&mut self) -> Result<f64> {
        self.ensure(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(f64::from_le_bytes(raw))
    }

    /// Take the next `len` bytes as a zero-copy slice.
    pub fn read_span(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        let span = self.buf.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(span)
    }

    /// Read a byte-list length tag.
    pub fn read_byte_list_length(&mut self) -> Result<usize> {
        let len = decode_list_length_checked(self.read_var_unsigned()?, WireType::List)?;
        self.check_limit(len)?;
        Ok(len)
    }

    /// Read a collection count written with `scheme`.
    ///
    /// The count is bounded by what the remaining bytes could possibly hold.
    pub fn read_list_length(&mut self, scheme: WireType) -> Result<usize> {
        let count = decode_list_length_checked(self.read_var_unsigned()?, scheme)?;
        let needed = count.saturating_mul(scheme.min_element_size());
        self.check_limit(needed)?;
        self.ensure(needed)?;
        Ok(count)
    }

    /// Read a length-prefixed byte span (zero-copy).
    pub fn read_bytes(&mut self) -> Result<Bytes> {
        let len = self.read_byte_list_length()?;
        self.read_span(len)
    }

    /// Read a length-prefixed string, deferring UTF-8 validation.
    #[inline]
    pub fn read_text(&mut self) -> Result<Text> {
        Ok(Text::from_raw(self.read_bytes()?))
    }

    /// Read a length-prefixed string, validating it now.
    pub fn read_string(&mut self) -> Result<String> {
        self.read_text()?.into_string()
    }

    /// Slice out a whole encoded object, length prefix included, without
    /// decoding it.
    pub fn read_object(&mut self) -> Result<Bytes> {
        let start = self.pos;
        let len = self.read_byte_list_length()?;
        self.ensure(len)?;
        self.pos += len;
        Ok(self.buf.slice(start..self.pos))
    }

    /// Skip one value of `wire_type` (unknown appended fields).
    pub fn skip(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => {
                self.read_var_unsigned()?;
            }
            WireType::FourByte | WireType::EightByte => {
                let width = wire_type.fixed_width().unwrap_or(0);
                self.ensure(width)?;
                self.pos += width;
            }
            WireType::List => {
                let len = self.read_byte_list_length()?;
                self.ensure(len)?;
                self.pos += len;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Serializer;

    #[test]
    fn test_signed_values_roundtrip() {
        let values = [0i64, 1, -1, 2, -2, i64::MAX, i64::MIN];
        let mut s = Serializer::new();
        for v in values {
            s.write_var_signed(v);
        }
        let mut d = Deserializer::new(s.freeze());
        for v in values {
            assert_eq!(d.read_var_signed().unwrap(), v);
        }
        assert!(d.is_done());
    }

    #[test]
    fn test_int_sequence_roundtrip() {
        let values = [0i32, 1, -1, 2, -2, i32::MAX, i32::MIN];
        let mut s = Serializer::new();
        for v in values {
            s.write_var_signed(i64::from(v));
        }
        let mut d = Deserializer::new(s.freeze());
        let decoded: Vec<i32> = values.iter().map(|_| d.read_var_i32().unwrap()).collect();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_var_i32_rejects_wide_value() {
        let mut s = Serializer::new();
        s.write_var_signed(i64::from(i32::MAX) + 1);
        let mut d = Deserializer::new(s.freeze());
        assert_eq!(
            d.read_var_i32().unwrap_err(),
            CodecError::VarintOutOfRange {
                value: i64::from(i32::MAX) + 1,
                target: "i32",
            }
        );
    }

    #[test]
    fn test_fixed_roundtrip_preserves_bits() {
        let mut s = Serializer::new();
        s.write_fixed4(f32::NAN);
        s.write_fixed8(-0.0);
        s.write_fixed8(123.456);
        let mut d = Deserializer::new(s.freeze());
        assert_eq!(d.read_fixed4().unwrap().to_bits(), f32::NAN.to_bits());
        assert_eq!(d.read_fixed8().unwrap().to_bits(), (-0.0f64).to_bits());
        assert_eq!(d.read_fixed8().unwrap(), 123.456);
    }

    #[test]
    fn test_read_past_end_is_underrun() {
        let mut d = Deserializer::from_slice(&[1, 2, 3]);
        let err = d.read_fixed4().unwrap_err();
        assert_eq!(
            err,
            CodecError::BufferUnderrun {
                needed: 4,
                remaining: 3
            }
        );
    }

    #[test]
    fn test_truncated_varint_is_underrun() {
        let mut d = Deserializer::from_slice(&[0x80, 0x80]);
        assert!(matches!(
            d.read_var_unsigned(),
            Err(CodecError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn test_malformed_varint() {
        let mut d = Deserializer::from_slice(&[0xFF; 12]);
        assert!(matches!(
            d.read_var_unsigned(),
            Err(CodecError::MalformedVarint(_))
        ));
    }

    #[test]
    fn test_bytes_are_zero_copy() {
        let mut s = Serializer::new();
        s.write_bytes(b"payload");
        let source = s.freeze();
        let mut d = Deserializer::new(source.clone());
        let span = d.read_bytes().unwrap();
        assert_eq!(&span[..], b"payload");
        assert_eq!(span.as_ptr(), source[1..].as_ptr());
    }

    #[test]
    fn test_declared_length_past_end() {
        // claims 10 bytes, has 2
        let mut d = Deserializer::from_slice(&[40, 1, 2]);
        assert!(matches!(
            d.read_bytes(),
            Err(CodecError::BufferUnderrun { needed: 10, .. })
        ));
    }

    #[test]
    fn test_read_object_keeps_prefix() {
        let mut s = Serializer::new();
        s.write_bytes(&[7, 7, 7]);
        s.write_var_signed(5);
        let mut d = Deserializer::new(s.freeze());
        let object = d.read_object().unwrap();
        assert_eq!(&object[..], &[12, 7, 7, 7]);
        assert_eq!(d.read_var_signed().unwrap(), 5);
    }

    #[test]
    fn test_payload_limit() {
        let config = CodecConfig {
            max_payload_size: 4,
        };
        let mut s = Serializer::new();
        s.write_bytes(b"too long");
        let mut d = Deserializer::with_config(s.freeze(), &config);
        assert_eq!(
            d.read_bytes().unwrap_err(),
            CodecError::PayloadTooLarge { size: 8, max: 4 }
        );
    }

    #[test]
    fn test_list_length_bounded_by_remaining() {
        let mut s = Serializer::new();
        s.write_list_length(1000, WireType::EightByte);
        s.write_fixed8(1.0);
        let mut d = Deserializer::new(s.freeze());
        assert!(matches!(
            d.read_list_length(WireType::EightByte),
            Err(CodecError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn test_skip_each_wire_type() {
        let mut s = Serializer::new();
        s.write_var_signed(-300);
        s.write_fixed4(1.5);
        s.write_fixed8(2.5);
        s.write_str("skipped");
        s.write_var_signed(9);
        let mut d = Deserializer::new(s.freeze());
        for wire_type in [
            WireType::Varint,
            WireType::FourByte,
            WireType::EightByte,
            WireType::List,
        ] {
            d.skip(wire_type).unwrap();
        }
        assert_eq!(d.read_var_signed().unwrap(), 9);
    }

    #[test]
    fn test_done_reports_trailing_bytes() {
        let mut d = Deserializer::from_slice(&[2, 4]);
        d.read_var_signed().unwrap();
        assert_eq!(d.done().unwrap_err(), CodecError::TrailingBytes(1));
    }
}
