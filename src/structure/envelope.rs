//! The structure envelope: traits and the shared encode/decode loop.

use std::cell::Cell;

use tracing::trace;

use crate::error::{CodecError, Result};
use crate::wire::{byte_list_encoded_size, encode_byte_list_length, Deserializer, Serializer};

use super::field_set::{FieldSet, FieldSets, Segment};

/// Anything that can be written as a self-delimiting encoded object.
///
/// `size` excludes the object's own length prefix; `encode_to` writes the
/// prefix followed by `size()` body bytes.
pub trait CodecObject {
    /// Body size in bytes, excluding the length prefix.
    fn size(&self) -> usize;

    /// Write the length prefix and body.
    fn encode_to(&self, s: &mut Serializer);

    /// Populate `self` from the next encoded object in `d`.
    fn decode_from(&mut self, d: &mut Deserializer) -> Result<()>;

    /// Total encoded size, length prefix included.
    fn encoded_size(&self) -> usize {
        byte_list_encoded_size(self.size())
    }
}

/// Lazily computed body size. Mutators must call [`SizeCache::invalidate`].
///
/// Always compares equal so it can sit inside `#[derive(PartialEq)]` structs.
#[derive(Debug, Default, Clone)]
pub struct SizeCache(Cell<Option<usize>>);

impl SizeCache {
    /// Create an empty cache.
    pub const fn new() -> Self {
        Self(Cell::new(None))
    }

    /// Cached value, computing and storing it on first use.
    #[inline]
    pub fn get_or_compute(&self, compute: impl FnOnce() -> usize) -> usize {
        match self.0.get() {
            Some(size) => size,
            None => {
                let size = compute();
                self.0.set(Some(size));
                size
            }
        }
    }

    /// Cached value, if any.
    #[inline]
    pub fn get(&self) -> Option<usize> {
        self.0.get()
    }

    #[inline]
    pub fn set(&self, size: usize) {
        self.0.set(Some(size));
    }

    #[inline]
    pub fn invalidate(&self) {
        self.0.set(None);
    }
}

impl PartialEq for SizeCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for SizeCache {}

/// A schema-described structure.
///
/// Implementors supply the segment table, their presence state and the value
/// coding for one segment at a time. Values inside a segment are always coded
/// in ascending presence-bit order.
///
/// Implement [`CodecObject`] by delegating to the provided methods, usually
/// through [`impl_codec_object!`](crate::impl_codec_object).
pub trait Structure {
    /// Segment table. Also the order field sets are written in.
    const LAYOUT: &'static [Segment];

    fn field_sets(&self) -> &FieldSets;
    fn field_sets_mut(&mut self) -> &mut FieldSets;
    fn size_cache(&self) -> &SizeCache;

    /// Encoded size of the values present in `field_set`.
    fn segment_size(&self, field_set: &FieldSet) -> usize;

    /// Write the values present in `field_set`.
    fn encode_segment(&self, field_set: &FieldSet, s: &mut Serializer);

    /// Read the values present in `field_set`.
    fn decode_segment(&mut self, field_set: &FieldSet, d: &mut Deserializer) -> Result<()>;

    /// Body size: every non-empty field set plus its values. Cached.
    fn structure_size(&self) -> usize {
        self.size_cache().get_or_compute(|| {
            self.field_sets()
                .iter()
                .filter(|set| !set.is_empty())
                .map(|set| set.encoded_size() + self.segment_size(set))
                .sum()
        })
    }

    /// Write the envelope: length prefix, then each non-empty field set.
    fn encode_structure(&self, s: &mut Serializer) {
        s.write_var_unsigned(encode_byte_list_length(self.structure_size()));
        for set in self.field_sets().iter().filter(|set| !set.is_empty()) {
            set.write_to(s);
            self.encode_segment(set, s);
        }
    }

    /// Read an envelope into `self`.
    ///
    /// Presence is reset first, so segments absent from the input decode as
    /// "nothing present". Bits beyond a segment's known mask are skipped by
    /// wire type; they must sit above every known bit.
    fn decode_structure(&mut self, d: &mut Deserializer) -> Result<()> {
        let declared = d.read_byte_list_length()?;
        if declared > d.remaining() {
            return Err(CodecError::BufferUnderrun {
                needed: declared,
                remaining: d.remaining(),
            });
        }

        let layout = Self::LAYOUT;
        let start = d.pos();
        let mut seen = vec![false; layout.len()];
        let mut skipped_unknown = false;
        self.field_sets_mut().clear();

        while d.pos() - start < declared {
            let header = FieldSet::read_from(d)?;
            let Some(slot) = self
                .field_sets()
                .slot_of(header.wire_type(), header.index())
            else {
                if self.field_sets().has_wire_type(header.wire_type()) {
                    return Err(CodecError::UnknownFieldSetIndex {
                        wire_type: header.wire_type(),
                        index: header.index(),
                    });
                }
                return Err(CodecError::UnexpectedFieldSetType(header.wire_type().tag()));
            };

            let segment = &layout[slot];
            let missing = header.missing(segment.required);
            if missing != 0 {
                return Err(CodecError::RequiredFieldMissing {
                    wire_type: segment.wire_type,
                    index: segment.index,
                    missing,
                });
            }

            let known =
                FieldSet::with_bits(segment.wire_type, segment.index, header.bits() & segment.known);
            self.field_sets_mut().replace(slot, known);
            self.decode_segment(&known, d)?;

            let unknown = header.bits() & !segment.known;
            if unknown != 0 {
                let unknown = FieldSet::with_bits(segment.wire_type, segment.index, unknown);
                for _ in unknown.present_fields() {
                    d.skip(segment.wire_type)?;
                }
                trace!(
                    wire_type = %segment.wire_type,
                    index = segment.index,
                    mask = unknown.bits(),
                    "Skipped unknown fields"
                );
                skipped_unknown = true;
            }
            seen[slot] = true;
        }

        let consumed = d.pos() - start;
        if consumed != declared {
            return Err(CodecError::LengthMismatch { declared, consumed });
        }

        for (segment, _) in layout.iter().zip(&seen).filter(|(_, seen)| !**seen) {
            if segment.required != 0 {
                return Err(CodecError::RequiredFieldMissing {
                    wire_type: segment.wire_type,
                    index: segment.index,
                    missing: segment.required,
                });
            }
        }

        // Skipped fields are not re-encoded, so the wire size no longer applies.
        if skipped_unknown {
            self.size_cache().invalidate();
        } else {
            self.size_cache().set(declared);
        }
        Ok(())
    }
}

/// Implement [`CodecObject`] for a [`Structure`] by delegation.
#[macro_export]
macro_rules! impl_codec_object {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::structure::CodecObject for $ty {
            fn size(&self) -> usize {
                $crate::structure::Structure::structure_size(self)
            }

            fn encode_to(&self, s: &mut $crate::wire::Serializer) {
                $crate::structure::Structure::encode_structure(self, s)
            }

            fn decode_from(
                &mut self,
                d: &mut $crate::wire::Deserializer,
            ) -> $crate::error::Result<()> {
                $crate::structure::Structure::decode_structure(self, d)
            }
        }
    )+};
}
