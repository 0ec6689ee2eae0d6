//! Per-element coding for collections.

use std::marker::PhantomData;

use crate::error::{CodecError, Result};
use crate::structure::CodecObject;
use crate::wire::{
    list_length_encoded_size, size_of_var_signed, Deserializer, Serializer, Text, WireType,
};

/// How one element type is written inside a collection.
///
/// Implemented by zero-sized marker types so a single generic [`List`] and
/// [`Map`] cover every element kind.
///
/// [`List`]: super::List
/// [`Map`]: super::Map
pub trait ElementCodec {
    /// In-memory element type.
    type Value;

    /// Wire type of one element; also tags the element count.
    const SCHEME: WireType;

    /// Encoded size of one element.
    fn element_size(value: &Self::Value) -> usize;

    fn write(s: &mut Serializer, value: &Self::Value);

    fn read(d: &mut Deserializer) -> Result<Self::Value>;

    /// Encoded size of a count followed by `values`.
    fn values_size(values: &[Self::Value]) -> usize {
        let elements = match Self::SCHEME.fixed_width() {
            Some(width) => width * values.len(),
            None => values.iter().map(Self::element_size).sum(),
        };
        list_length_encoded_size(values.len(), Self::SCHEME) + elements
    }

    /// Write a count followed by `values`.
    fn write_values(s: &mut Serializer, values: &[Self::Value]) {
        s.write_list_length(values.len(), Self::SCHEME);
        for value in values {
            Self::write(s, value);
        }
    }

    /// Read a count followed by that many values.
    fn read_values(d: &mut Deserializer) -> Result<Vec<Self::Value>> {
        let count = d.read_list_length(Self::SCHEME)?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(Self::read(d)?);
        }
        Ok(values)
    }
}

macro_rules! varint_elements {
    ($(#[$doc:meta] $name:ident => $ty:ty),+ $(,)?) => {$(
        #[$doc]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl ElementCodec for $name {
            type Value = $ty;
            const SCHEME: WireType = WireType::Varint;

            #[inline]
            fn element_size(value: &$ty) -> usize {
                size_of_var_signed(i64::from(*value))
            }

            #[inline]
            fn write(s: &mut Serializer, value: &$ty) {
                s.write_var_signed(i64::from(*value));
            }

            #[inline]
            fn read(d: &mut Deserializer) -> Result<$ty> {
                let value = d.read_var_signed()?;
                <$ty>::try_from(value).map_err(|_| CodecError::VarintOutOfRange {
                    value,
                    target: stringify!($ty),
                })
            }
        }
    )+};
}

varint_elements! {
    /// Zigzag varint `i8` elements.
    ByteElements => i8,
    /// Zigzag varint `i16` elements.
    ShortElements => i16,
    /// Zigzag varint `i32` elements.
    IntElements => i32,
    /// Zigzag varint `i64` elements.
    LongElements => i64,
}

/// Booleans as zigzag varints 0/1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolElements;

impl ElementCodec for BoolElements {
    type Value = bool;
    const SCHEME: WireType = WireType::Varint;

    #[inline]
    fn element_size(_: &bool) -> usize {
        1
    }

    #[inline]
    fn write(s: &mut Serializer, value: &bool) {
        s.write_bool(*value);
    }

    #[inline]
    fn read(d: &mut Deserializer) -> Result<bool> {
        d.read_bool()
    }
}

/// Little-endian `f32` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatElements;

impl ElementCodec for FloatElements {
    type Value = f32;
    const SCHEME: WireType = WireType::FourByte;

    #[inline]
    fn element_size(_: &f32) -> usize {
        4
    }

    #[inline]
    fn write(s: &mut Serializer, value: &f32) {
        s.write_fixed4(*value);
    }

    #[inline]
    fn read(d: &mut Deserializer) -> Result<f32> {
        d.read_fixed4()
    }
}

/// Little-endian `f64` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleElements;

impl ElementCodec for DoubleElements {
    type Value = f64;
    const SCHEME: WireType = WireType::EightByte;

    #[inline]
    fn element_size(_: &f64) -> usize {
        8
    }

    #[inline]
    fn write(s: &mut Serializer, value: &f64) {
        s.write_fixed8(*value);
    }

    #[inline]
    fn read(d: &mut Deserializer) -> Result<f64> {
        d.read_fixed8()
    }
}

/// Length-prefixed UTF-8 strings, validated on access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringElements;

impl ElementCodec for StringElements {
    type Value = Text;
    const SCHEME: WireType = WireType::List;

    #[inline]
    fn element_size(value: &Text) -> usize {
        value.encoded_size()
    }

    #[inline]
    fn write(s: &mut Serializer, value: &Text) {
        s.write_text(value);
    }

    #[inline]
    fn read(d: &mut Deserializer) -> Result<Text> {
        d.read_text()
    }
}

/// Nested encoded objects, each carrying its own envelope.
pub struct StructElements<T>(PhantomData<T>);

impl<T: CodecObject + Default> ElementCodec for StructElements<T> {
    type Value = T;
    const SCHEME: WireType = WireType::List;

    #[inline]
    fn element_size(value: &T) -> usize {
        value.encoded_size()
    }

    #[inline]
    fn write(s: &mut Serializer, value: &T) {
        value.encode_to(s);
    }

    fn read(d: &mut Deserializer) -> Result<T> {
        let mut value = T::default();
        value.decode_from(d)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn test_values_size_matches_written() {
        let longs = [0i64, -1, 1 << 40, i64::MIN];
        let mut s = Serializer::new();
        LongElements::write_values(&mut s, &longs);
        assert_eq!(s.len(), LongElements::values_size(&longs));

        let doubles = [1.5f64; 3];
        let mut s = Serializer::new();
        DoubleElements::write_values(&mut s, &doubles);
        assert_eq!(s.len(), 1 + 24);
    }

    #[test]
    fn test_narrow_elements_reject_wide_values() {
        let mut s = Serializer::new();
        s.write_var_signed(200);
        s.write_var_signed(i64::from(i8::MIN));
        let mut d = Deserializer::new(s.freeze());
        assert_eq!(
            ByteElements::read(&mut d).unwrap_err(),
            CodecError::VarintOutOfRange {
                value: 200,
                target: "i8",
            }
        );
        assert_eq!(ByteElements::read(&mut d).unwrap(), i8::MIN);

        let mut s = Serializer::new();
        ShortElements::write_values(&mut s, &[i16::MAX]);
        let mut d = Deserializer::new(s.freeze());
        assert_eq!(
            ByteElements::read_values(&mut d).unwrap_err(),
            CodecError::VarintOutOfRange {
                value: i64::from(i16::MAX),
                target: "i8",
            }
        );
    }

    #[test]
    fn test_count_scheme_is_checked() {
        let mut s = Serializer::new();
        DoubleElements::write_values(&mut s, &[1.0]);
        let mut d = Deserializer::new(s.freeze());
        assert_eq!(
            LongElements::read_values(&mut d).unwrap_err(),
            CodecError::CountSchemeMismatch {
                expected: WireType::Varint,
                found: WireType::EightByte,
            }
        );
    }

    #[test]
    fn test_bool_elements_are_zero_or_one() {
        let mut s = Serializer::new();
        BoolElements::write_values(&mut s, &[true, false]);
        // count 2 with varint tag, then zigzag(1) = 2 and zigzag(0) = 0
        assert_eq!(s.as_slice(), &[(2 << 2) | 1, 2, 0]);
    }

    #[test]
    fn test_byte_elements_roundtrip_extremes() {
        let bytes = [i8::MIN, -1, 0, i8::MAX];
        let mut s = Serializer::new();
        ByteElements::write_values(&mut s, &bytes);
        let mut d = Deserializer::new(s.freeze());
        assert_eq!(ByteElements::read_values(&mut d).unwrap(), bytes);
    }
}
