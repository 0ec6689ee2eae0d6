//! Field set headers and per-structure presence state.

use crate::error::Result;
use crate::wire::{
    size_of_var_unsigned, Deserializer, Serializer, WireType, CONTINUATION_FLAG,
    FIELDS_PER_SEGMENT, FIRST_FIELD_BIT, TYPE_MASK,
};

/// Presence bit for the field at `position` (0-based) within its segment.
#[inline]
pub const fn field_bit(position: u32) -> u64 {
    assert!(position < FIELDS_PER_SEGMENT);
    1 << (FIRST_FIELD_BIT + position)
}

const PRESENCE_MASK: u64 = !(TYPE_MASK | CONTINUATION_FLAG);

/// Static description of one segment of a structure's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Wire type shared by every field in the segment.
    pub wire_type: WireType,
    /// Segment number; 0 is the base segment, 1.. are continuations.
    pub index: u32,
    /// Presence bits that must be set whenever the segment is decoded.
    pub required: u64,
    /// Presence bits this schema version knows how to decode.
    pub known: u64,
}

impl Segment {
    /// Describe a segment. Required fields must also be known.
    pub const fn new(wire_type: WireType, index: u32, required: u64, known: u64) -> Self {
        Self {
            wire_type,
            index,
            required: required & PRESENCE_MASK,
            known: (known | required) & PRESENCE_MASK,
        }
    }
}

/// One field set header: which fields of one segment are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSet {
    wire_type: WireType,
    index: u32,
    bits: u64,
}

impl FieldSet {
    /// An empty field set for a segment.
    pub const fn new(wire_type: WireType, index: u32) -> Self {
        Self {
            wire_type,
            index,
            bits: 0,
        }
    }

    /// A field set with the given presence bits.
    pub const fn with_bits(wire_type: WireType, index: u32, bits: u64) -> Self {
        Self {
            wire_type,
            index,
            bits: bits & PRESENCE_MASK,
        }
    }

    /// Wire type of the segment.
    #[inline]
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Segment number (0 = base segment).
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Presence bits only (bits 3..63).
    #[inline]
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Check if no field is present. Empty field sets are not written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Check if the field with presence bit `field` is present.
    #[inline]
    pub fn has(&self, field: u64) -> bool {
        self.bits & field != 0
    }

    /// Mark a field present or absent.
    #[inline]
    pub fn set(&mut self, field: u64, present: bool) {
        if present {
            self.bits |= field & PRESENCE_MASK;
        } else {
            self.bits &= !field;
        }
    }

    /// Required bits not covered by this field set.
    #[inline]
    pub fn missing(&self, required: u64) -> u64 {
        required & !self.bits
    }

    /// Present fields' bits in ascending schema order.
    pub fn present_fields(&self) -> impl Iterator<Item = u64> {
        let bits = self.bits;
        (FIRST_FIELD_BIT..64)
            .map(|position| 1u64 << position)
            .filter(move |bit| bits & bit != 0)
    }

    /// The header varint value.
    #[inline]
    pub fn header(&self) -> u64 {
        let continuation = if self.index > 0 { CONTINUATION_FLAG } else { 0 };
        self.bits | continuation | u64::from(self.wire_type.tag())
    }

    /// Encoded size of the header, continuation index included.
    pub fn encoded_size(&self) -> usize {
        let mut size = size_of_var_unsigned(self.header());
        if self.index > 0 {
            size += size_of_var_unsigned(u64::from(self.index - 1));
        }
        size
    }

    /// Write the header (and continuation index, if any).
    pub fn write_to(&self, s: &mut Serializer) {
        s.write_var_unsigned(self.header());
        if self.index > 0 {
            s.write_var_unsigned(u64::from(self.index - 1));
        }
    }

    /// Read a header (and continuation index, if flagged).
    pub fn read_from(d: &mut Deserializer) -> Result<Self> {
        let header = d.read_var_unsigned()?;
        let index = if header & CONTINUATION_FLAG != 0 {
            d.read_var_u32()?.saturating_add(1)
        } else {
            0
        };
        Ok(Self {
            wire_type: WireType::from_tag(header),
            index,
            bits: header & PRESENCE_MASK,
        })
    }
}

/// Presence state of every segment in a structure's schema.
///
/// Field sets are kept in schema-table order, which is also the order they
/// are written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSets {
    layout: &'static [Segment],
    sets: Vec<FieldSet>,
}

impl FieldSets {
    /// Presence for a freshly constructed structure: only required fields set.
    pub fn new(layout: &'static [Segment]) -> Self {
        let sets = layout
            .iter()
            .map(|segment| FieldSet::with_bits(segment.wire_type, segment.index, segment.required))
            .collect();
        Self { layout, sets }
    }

    /// The schema table.
    #[inline]
    pub fn layout(&self) -> &'static [Segment] {
        self.layout
    }

    /// All field sets, including empty ones.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &FieldSet> {
        self.sets.iter()
    }

    /// Field set at table position `slot`.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<&FieldSet> {
        self.sets.get(slot)
    }

    /// Check whether `field` is present in the segment at `slot`.
    #[inline]
    pub fn has(&self, slot: usize, field: u64) -> bool {
        self.sets.get(slot).is_some_and(|set| set.has(field))
    }

    /// Mark `field` in the segment at `slot` present or absent.
    #[inline]
    pub fn set(&mut self, slot: usize, field: u64, present: bool) {
        if let Some(set) = self.sets.get_mut(slot) {
            set.set(field, present);
        }
    }

    /// Table position of a segment.
    pub fn slot_of(&self, wire_type: WireType, index: u32) -> Option<usize> {
        self.layout
            .iter()
            .position(|segment| segment.wire_type == wire_type && segment.index == index)
    }

    /// Check if the schema has any segment of `wire_type`.
    pub fn has_wire_type(&self, wire_type: WireType) -> bool {
        self.layout.iter().any(|segment| segment.wire_type == wire_type)
    }

    /// Replace the field set at `slot`.
    pub(crate) fn replace(&mut self, slot: usize, set: FieldSet) {
        if let Some(existing) = self.sets.get_mut(slot) {
            *existing = set;
        }
    }

    /// Clear every presence bit (decode starts from "nothing present").
    pub(crate) fn clear(&mut self) {
        for set in &mut self.sets {
            set.bits = 0;
        }
    }
}
