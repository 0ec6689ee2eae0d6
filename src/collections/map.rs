//! Generic string-keyed map.
//!
//! Keys and values are kept as parallel arrays, which is also the wire
//! layout: the key strings as one list body, then the values as another.
//! Lookups are linear; these maps are payload containers, not indexes.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::trace;

use crate::error::{CodecError, Result};
use crate::structure::{CodecObject, SizeCache};
use crate::wire::{encode_byte_list_length, Deserializer, Serializer, Text};

use super::element::{
    BoolElements, ByteElements, DoubleElements, ElementCodec, FloatElements, IntElements,
    LongElements, ShortElements, StringElements, StructElements,
};

pub type BooleanMap = Map<BoolElements>;
pub type ByteMap = Map<ByteElements>;
pub type ShortMap = Map<ShortElements>;
pub type IntMap = Map<IntElements>;
pub type LongMap = Map<LongElements>;
pub type FloatMap = Map<FloatElements>;
pub type DoubleMap = Map<DoubleElements>;
pub type StringMap = Map<StringElements>;
pub type StructMap<T> = Map<StructElements<T>>;

/// Insertion-ordered map from strings to one element kind.
pub struct Map<C: ElementCodec> {
    keys: Vec<Text>,
    values: Vec<C::Value>,
    size: SizeCache,
}

impl<C: ElementCodec> Map<C> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            size: SizeCache::new(),
        }
    }

    /// Build from a standard map. Iteration order of `map` becomes wire order.
    pub fn from_map(map: HashMap<String, C::Value>) -> Self {
        let (keys, values) = map
            .into_iter()
            .map(|(key, value)| (Text::from(key), value))
            .unzip();
        Self {
            keys,
            values,
            size: SizeCache::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.keys
            .iter()
            .position(|existing| existing.as_bytes() == key.as_bytes())
    }

    pub fn get(&self, key: &str) -> Option<&C::Value> {
        self.position(key).map(|index| &self.values[index])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert or overwrite. Returns the previous value for `key`.
    pub fn insert(&mut self, key: impl Into<Text>, value: C::Value) -> Option<C::Value> {
        let key = key.into();
        self.size.invalidate();
        let existing = self
            .keys
            .iter()
            .position(|k| k.as_bytes() == key.as_bytes());
        match existing {
            Some(index) => Some(std::mem::replace(&mut self.values[index], value)),
            None => {
                self.keys.push(key);
                self.values.push(value);
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<C::Value> {
        let index = self.position(key)?;
        self.size.invalidate();
        self.keys.remove(index);
        Some(self.values.remove(index))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Text> {
        self.keys.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &C::Value> {
        self.values.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Text, &C::Value)> {
        self.keys.iter().zip(self.values.iter())
    }

    /// Convert to a standard map. Later duplicates win.
    pub fn to_map(&self) -> Result<HashMap<String, C::Value>>
    where
        C::Value: Clone,
    {
        let mut map = HashMap::with_capacity(self.len());
        for (key, value) in self.iter() {
            map.insert(key.as_str()?.to_owned(), value.clone());
        }
        Ok(map)
    }
}

impl<C: ElementCodec> CodecObject for Map<C> {
    fn size(&self) -> usize {
        self.size.get_or_compute(|| {
            StringElements::values_size(&self.keys) + C::values_size(&self.values)
        })
    }

    fn encode_to(&self, s: &mut Serializer) {
        s.write_var_unsigned(encode_byte_list_length(self.size()));
        StringElements::write_values(s, &self.keys);
        C::write_values(s, &self.values);
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
        let keys = StringElements::read_values(d)?;
        let values = C::read_values(d)?;
        if keys.len() != values.len() {
            return Err(CodecError::LengthMismatch {
                declared: keys.len(),
                consumed: values.len(),
            });
        }
        let consumed = d.pos() - start;
        if consumed != declared {
            return Err(CodecError::LengthMismatch { declared, consumed });
        }
        let total = keys.len();
        let (keys, values) = collapse_duplicates(keys, values);
        if keys.len() == total {
            self.size.set(declared);
        } else {
            trace!(dropped = total - keys.len(), "Collapsed duplicate map keys");
            self.size.invalidate();
        }
        self.keys = keys;
        self.values = values;
        Ok(())
    }
}

/// Keep the last value written for each key.
fn collapse_duplicates<V>(keys: Vec<Text>, values: Vec<V>) -> (Vec<Text>, Vec<V>) {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(keys.len());
        let mut keep: Vec<bool> = keys.iter().rev().map(|key| seen.insert(key)).collect();
        keep.reverse();
        keep
    };
    if keep.iter().all(|&kept| kept) {
        return (keys, values);
    }
    keys.into_iter()
        .zip(values)
        .zip(keep)
        .filter_map(|(entry, kept)| kept.then_some(entry))
        .unzip()
}

impl<C: ElementCodec> Default for Map<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ElementCodec> Clone for Map<C>
where
    C::Value: Clone,
{
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            values: self.values.clone(),
            size: self.size.clone(),
        }
    }
}

impl<C: ElementCodec> PartialEq for Map<C>
where
    C::Value: PartialEq,
{
    /// Entry-wise; storage order does not matter.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let index: HashMap<&Text, &C::Value> = other.iter().collect();
        self.iter()
            .all(|(key, value)| index.get(key).is_some_and(|other| *other == value))
    }
}

impl<C: ElementCodec> fmt::Debug for Map<C>
where
    C::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<C: ElementCodec> From<HashMap<String, C::Value>> for Map<C> {
    fn from(map: HashMap<String, C::Value>) -> Self {
        Self::from_map(map)
    }
}

impl<C: ElementCodec, K: Into<Text>> FromIterator<(K, C::Value)> for Map<C> {
    fn from_iter<I: IntoIterator<Item = (K, C::Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}
