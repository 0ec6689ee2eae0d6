//! Optional top-level payload wrapper.

use std::fmt;

use crate::error::Result;
use crate::structure::{
    field_bit, CodecObject, FieldSet, FieldSets, Lazy, Segment, SizeCache, Structure,
};
use crate::wire::{Deserializer, Serializer, WireType};

const LIST: usize = 0;
const ITEM: u64 = field_bit(0);

const LAYOUT: [Segment; 1] = [Segment::new(WireType::List, 0, 0, ITEM)];

/// Structure with one optional, lazily decoded item.
pub struct OptionalObject<T> {
    field_sets: FieldSets,
    size: SizeCache,
    item: Option<Lazy<T>>,
}

impl<T: CodecObject + Default> OptionalObject<T> {
    pub fn new(item: T) -> Self {
        let mut wrapper = Self::default();
        wrapper.set_item(item);
        wrapper
    }

    pub fn has_item(&self) -> bool {
        self.field_sets.has(LIST, ITEM)
    }

    /// The item, decoding it on first access.
    pub fn item(&self) -> Result<Option<&T>> {
        match &self.item {
            Some(item) if self.has_item() => item.get().map(Some),
            _ => Ok(None),
        }
    }

    /// Mutable access to the item, if present.
    pub fn item_mut(&mut self) -> Result<Option<&mut T>> {
        if !self.has_item() {
            return Ok(None);
        }
        self.size.invalidate();
        match &mut self.item {
            Some(item) => item.get_mut().map(Some),
            None => Ok(None),
        }
    }

    pub fn set_item(&mut self, item: T) {
        self.item = Some(Lazy::new(item));
        self.field_sets.set(LIST, ITEM, true);
        self.size.invalidate();
    }

    pub fn clear_item(&mut self) {
        self.item = None;
        self.field_sets.set(LIST, ITEM, false);
        self.size.invalidate();
    }

    /// Consume the wrapper, decoding the item if it was never accessed.
    pub fn into_item(self) -> Result<Option<T>> {
        let present = self.has_item();
        match self.item {
            Some(item) if present => item.into_inner().map(Some),
            _ => Ok(None),
        }
    }
}

impl<T> Default for OptionalObject<T> {
    fn default() -> Self {
        Self {
            field_sets: FieldSets::new(&LAYOUT),
            size: SizeCache::new(),
            item: None,
        }
    }
}

impl<T: Clone> Clone for OptionalObject<T> {
    fn clone(&self) -> Self {
        Self {
            field_sets: self.field_sets.clone(),
            size: self.size.clone(),
            item: self.item.clone(),
        }
    }
}

impl<T: CodecObject + Default + PartialEq> PartialEq for OptionalObject<T> {
    fn eq(&self, other: &Self) -> bool {
        self.field_sets == other.field_sets && self.item == other.item
    }
}

impl<T: fmt::Debug> fmt::Debug for OptionalObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalObject")
            .field("item", &self.item)
            .finish()
    }
}

impl<T: CodecObject + Default> Structure for OptionalObject<T> {
    const LAYOUT: &'static [Segment] = &LAYOUT;

    fn field_sets(&self) -> &FieldSets {
        &self.field_sets
    }

    fn field_sets_mut(&mut self) -> &mut FieldSets {
        &mut self.field_sets
    }

    fn size_cache(&self) -> &SizeCache {
        &self.size
    }

    fn segment_size(&self, set: &FieldSet) -> usize {
        match (&self.item, set.has(ITEM)) {
            (Some(item), true) => item.encoded_size(),
            _ => 0,
        }
    }

    fn encode_segment(&self, set: &FieldSet, s: &mut Serializer) {
        if let (Some(item), true) = (&self.item, set.has(ITEM)) {
            item.encode_to(s);
        }
    }

    fn decode_segment(&mut self, set: &FieldSet, d: &mut Deserializer) -> Result<()> {
        if set.has(ITEM) {
            self.item = Some(Lazy::read_from(d)?);
        }
        Ok(())
    }
}

impl<T: CodecObject + Default> CodecObject for OptionalObject<T> {
    fn size(&self) -> usize {
        self.structure_size()
    }

    fn encode_to(&self, s: &mut Serializer) {
        self.encode_structure(s)
    }

    fn decode_from(&mut self, d: &mut Deserializer) -> Result<()> {
        self.decode_structure(d)
    }
}
