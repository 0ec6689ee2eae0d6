//! Buffer writer for the wire codec.
//!
//! Uses `bytes::BytesMut` so a finished payload can be frozen into a
//! shareable `Bytes` without copying. Writers never fail: sizes are
//! validated by the caller before encoding (see [`crate::codec::ObjectCodec`]).

use bytes::{BufMut, Bytes, BytesMut};

use super::constants::{encode_byte_list_length, encode_list_length, WireType};
use super::text::Text;
use super::varint::{put_var_unsigned, zigzag_encode};

/// Growable output buffer with typed write operations.
#[derive(Debug, Default)]
pub struct Serializer {
    buf: BytesMut,
}

impl Serializer {
    /// Create an empty serializer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Create a serializer pre-sized for `capacity` bytes.
    ///
    /// Pass the object's `size()` plus its envelope prefix to encode without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Write a plain varint (headers, counts, lengths).
    #[inline]
    pub fn write_var_unsigned(&mut self, value: u64) {
        put_var_unsigned(&mut self.buf, value);
    }

    /// Write a zigzag varint.
    #[inline]
    pub fn write_var_signed(&mut self, value: i64) {
        put_var_unsigned(&mut self.buf, zigzag_encode(value));
    }

    /// Write a boolean as a zigzag varint 0 or 1.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_var_signed(i64::from(value));
    }

    /// Write the raw bits of an `f32`.
    #[inline]
    pub fn write_fixed4(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    /// Write the raw bits of an `f64`.
    #[inline]
    pub fn write_fixed8(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    /// Write a count tag for `count` elements of `scheme`.
    #[inline]
    pub fn write_list_length(&mut self, count: usize, scheme: WireType) {
        self.write_var_unsigned(encode_list_length(count, scheme));
    }

    /// Write a length-prefixed byte span.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_var_unsigned(encode_byte_list_length(bytes.len()));
        self.buf.put_slice(bytes);
    }

    /// Write a length-prefixed UTF-8 string.
    #[inline]
    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Write a string field without converting it if it is still raw.
    #[inline]
    pub fn write_text(&mut self, value: &Text) {
        self.write_bytes(value.as_bytes());
    }

    /// Copy an already-encoded object (prefix included) verbatim.
    #[inline]
    pub fn write_encoded_object(&mut self, encoded: &[u8]) {
        self.buf.put_slice(encoded);
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the written bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Finish writing and return the payload (zero-copy).
    #[inline]
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_var_signed_layout() {
        let mut s = Serializer::new();
        s.write_var_signed(-1);
        s.write_var_signed(1);
        s.write_var_signed(-64);
        assert_eq!(s.as_slice(), &[0x01, 0x02, 0x7F]);
    }

    #[test]
    fn test_write_bool() {
        let mut s = Serializer::new();
        s.write_bool(false);
        s.write_bool(true);
        assert_eq!(s.as_slice(), &[0x00, 0x02]);
    }

    #[test]
    fn test_fixed_width_little_endian() {
        let mut s = Serializer::new();
        s.write_fixed4(1.0);
        s.write_fixed8(-2.5);
        let bytes = s.freeze();
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..], &(-2.5f64).to_le_bytes());
    }

    #[test]
    fn test_write_bytes_prefix() {
        let mut s = Serializer::new();
        s.write_bytes(b"abc");
        // byte-list tag: 3 << 2 | LIST
        assert_eq!(s.as_slice(), &[12, b'a', b'b', b'c']);
    }

    #[test]
    fn test_write_empty_bytes() {
        let mut s = Serializer::new();
        s.write_bytes(b"");
        assert_eq!(s.as_slice(), &[0]);
    }

    #[test]
    fn test_write_encoded_object_is_verbatim() {
        let mut s = Serializer::new();
        s.write_encoded_object(&[8, 1, 2]);
        assert_eq!(s.as_slice(), &[8, 1, 2]);
    }

    #[test]
    fn test_with_capacity_does_not_reallocate() {
        let mut s = Serializer::with_capacity(16);
        let before = s.as_slice().as_ptr();
        s.write_bytes(b"0123456789");
        assert_eq!(s.len(), 11);
        assert_eq!(s.as_slice().as_ptr(), before);
    }

    #[test]
    fn test_write_list_length() {
        let mut s = Serializer::new();
        s.write_list_length(2, WireType::FourByte);
        assert_eq!(s.as_slice(), &[0b1010]);
    }
}
