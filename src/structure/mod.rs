//! Field-presence protocol and the structure envelope.
//!
//! An encoded structure is a length-prefixed run of field sets:
//!
//! ```text
//! varint(byte_list_length(size)) ++ field_set* 
//! field_set = varint(header) [++ varint(segment - 1)] ++ value*
//! header    = presence bits (3..63) | continuation flag (bit 2) | wire type (bits 0-1)
//! ```
//!
//! Fields are never named on the wire: a present field is identified only by
//! its bit position within the segment of its wire type.
//!
//! Implementations provide a static [`Segment`] table and per-segment value
//! coding through [`Structure`]; the envelope loop, size caching and
//! required-field checks come from the trait's provided methods.

mod envelope;
mod field_set;
mod lazy;

pub use envelope::{CodecObject, SizeCache, Structure};
pub use field_set::{field_bit, FieldSet, FieldSets, Segment};
pub use lazy::Lazy;
