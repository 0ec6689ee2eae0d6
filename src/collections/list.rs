//! Generic typed list.

use std::fmt;
use std::ops::Index;

use crate::error::{CodecError, Result};
use crate::structure::{CodecObject, SizeCache};
use crate::wire::{encode_byte_list_length, Deserializer, Serializer, Text};

use super::element::{
    BoolElements, ByteElements, DoubleElements, ElementCodec, FloatElements, IntElements,
    LongElements, ShortElements, StringElements, StructElements,
};

pub type BooleanList = List<BoolElements>;
pub type ByteList = List<ByteElements>;
pub type ShortList = List<ShortElements>;
pub type IntList = List<IntElements>;
pub type LongList = List<LongElements>;
pub type FloatList = List<FloatElements>;
pub type DoubleList = List<DoubleElements>;
pub type StringList = List<StringElements>;
pub type StructList<T> = List<StructElements<T>>;

/// Ordered collection of one element kind, encoded as its own object.
pub struct List<C: ElementCodec> {
    items: Vec<C::Value>,
    size: SizeCache,
}

impl<C: ElementCodec> List<C> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            size: SizeCache::new(),
        }
    }

    pub fn from_vec(items: Vec<C::Value>) -> Self {
        Self {
            items,
            size: SizeCache::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&C::Value> {
        self.items.get(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[C::Value] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, C::Value> {
        self.items.iter()
    }

    pub fn push(&mut self, value: C::Value) {
        self.items.push(value);
        self.size.invalidate();
    }

    /// Replace the element at `index`. Returns the old value, or `None`
    /// (leaving the list untouched) if out of range.
    pub fn replace(&mut self, index: usize, value: C::Value) -> Option<C::Value> {
        let slot = self.items.get_mut(index)?;
        self.size.invalidate();
        Some(std::mem::replace(slot, value))
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.size.invalidate();
    }

    pub fn into_vec(self) -> Vec<C::Value> {
        self.items
    }
}

impl List<StringElements> {
    /// Push anything string-like.
    pub fn push_str(&mut self, value: impl Into<Text>) {
        self.push(value.into());
    }

    /// Decode every element into an owned `String`.
    pub fn to_strings(&self) -> Result<Vec<String>> {
        self.items
            .iter()
            .map(|text| text.as_str().map(str::to_owned))
            .collect()
    }
}

impl<C: ElementCodec> CodecObject for List<C> {
    fn size(&self) -> usize {
        self.size.get_or_compute(|| C::values_size(&self.items))
    }

    fn encode_to(&self, s: &mut Serializer) {
        s.write_var_unsigned(encode_byte_list_length(self.size()));
        C::write_values(s, &self.items);
    }

    fn decode_from(&mut self, d: &mut Deserializer) -> Result<()> {
        let declared = d.read_byte_list_length()?;
        if declared > d.remaining() {
            return Err(CodecError::BufferUnderrun {
                needed: declared,
                remaining: d.remaining(),
            });
        }
        let start = d.pos();
        self.items = C::read_values(d)?;
        let consumed = d.pos() - start;
        if consumed != declared {
            return Err(CodecError::LengthMismatch { declared, consumed });
        }
        self.size.set(declared);
        Ok(())
    }
}

impl<C: ElementCodec> Default for List<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ElementCodec> Clone for List<C>
where
    C::Value: Clone,
{
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            size: self.size.clone(),
        }
    }
}

impl<C: ElementCodec> PartialEq for List<C>
where
    C::Value: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<C: ElementCodec> fmt::Debug for List<C>
where
    C::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<C: ElementCodec> From<Vec<C::Value>> for List<C> {
    fn from(items: Vec<C::Value>) -> Self {
        Self::from_vec(items)
    }
}

impl<C: ElementCodec> FromIterator<C::Value> for List<C> {
    fn from_iter<I: IntoIterator<Item = C::Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<C: ElementCodec> Index<usize> for List<C> {
    type Output = C::Value;

    fn index(&self, index: usize) -> &C::Value {
        &self.items[index]
    }
}

impl<'a, C: ElementCodec> IntoIterator for &'a List<C> {
    type Item = &'a C::Value;
    type IntoIter = std::slice::Iter<'a, C::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::WireType;

    fn roundtrip<C: ElementCodec>(list: &List<C>) -> List<C> {
        let mut s = Serializer::new();
        list.encode_to(&mut s);
        assert_eq!(s.len(), list.encoded_size());
        let mut d = Deserializer::new(s.freeze());
        let mut out = List::new();
        out.decode_from(&mut d).unwrap();
        d.done().unwrap();
        out
    }

    #[test]
    fn test_int_list_wire_bytes() {
        let list = IntList::from(vec![1, -1]);
        let mut s = Serializer::new();
        list.encode_to(&mut s);
        // body: count tag (2 << 2 | varint), zigzag 1 = 2, zigzag -1 = 1
        assert_eq!(s.as_slice(), &[3 << 2, (2 << 2) | 1, 2, 1]);
    }

    #[test]
    fn test_empty_list() {
        let list = DoubleList::new();
        assert_eq!(list.size(), 1);
        assert!(roundtrip(&list).is_empty());
    }

    #[test]
    fn test_every_element_kind_at_scale() {
        for n in [0usize, 1, 10_000] {
            let bools: BooleanList = (0..n).map(|i| i % 3 == 0).collect();
            assert_eq!(roundtrip(&bools), bools);

            let bytes: ByteList = (0..n).map(|i| i as i8).collect();
            assert_eq!(roundtrip(&bytes), bytes);

            let shorts: ShortList = (0..n).map(|i| (i as i16).wrapping_mul(37)).collect();
            assert_eq!(roundtrip(&shorts), shorts);

            let ints: IntList = (0..n).map(|i| i as i32 - 5_000).collect();
            assert_eq!(roundtrip(&ints), ints);

            let longs: LongList = (0..n).map(|i| (i as i64) << 40).collect();
            assert_eq!(roundtrip(&longs), longs);

            let floats: FloatList = (0..n).map(|i| i as f32 * 0.5).collect();
            assert_eq!(roundtrip(&floats), floats);

            let doubles: DoubleList = (0..n).map(|i| i as f64 / 3.0).collect();
            assert_eq!(roundtrip(&doubles), doubles);

            let strings: StringList = (0..n).map(|i| Text::from(format!("s{i}"))).collect();
            assert_eq!(roundtrip(&strings), strings);

            let nested: StructList<IntList> =
                (0..n).map(|i| IntList::from(vec![i as i32; i % 4])).collect();
            assert_eq!(roundtrip(&nested), nested);
        }
    }

    #[test]
    fn test_size_cached_and_invalidated() {
        let mut list = LongList::new();
        assert_eq!(list.size(), 1);
        list.push(1 << 20);
        assert_eq!(list.size(), 1 + 4);
        list.replace(0, 0);
        assert_eq!(list.size(), 2);
        assert!(list.replace(5, 0).is_none());
    }

    #[test]
    fn test_wrong_element_scheme_rejected() {
        let mut s = Serializer::new();
        FloatList::from(vec![1.0]).encode_to(&mut s);
        let mut d = Deserializer::new(s.freeze());
        let err = IntList::new().decode_from(&mut d).unwrap_err();
        assert_eq!(
            err,
            CodecError::CountSchemeMismatch {
                expected: WireType::Varint,
                found: WireType::FourByte,
            }
        );
    }

    #[test]
    fn test_declared_length_disagrees() {
        // envelope says 3 bytes, the list body is 2
        let mut d = Deserializer::from_slice(&[3 << 2, (1 << 2) | 1, 2, 0]);
        let err = IntList::new().decode_from(&mut d).unwrap_err();
        assert_eq!(
            err,
            CodecError::LengthMismatch {
                declared: 3,
                consumed: 2,
            }
        );
    }

    #[test]
    fn test_string_list_helpers() {
        let mut list = StringList::new();
        list.push_str("a");
        list.push_str(String::from("bc"));
        assert_eq!(roundtrip(&list).to_strings().unwrap(), vec!["a", "bc"]);
    }
}
