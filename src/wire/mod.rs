//! Primitive wire codec.
//!
//! Leaf-level encoding shared by every structure and collection:
//! - zigzag varints and plain varints (base-128, little-endian groups)
//! - fixed-width 4/8-byte little-endian values
//! - byte-list framing for strings, blobs and nested objects
//! - size calculators that agree exactly with what the writers produce
//!
//! # Example
//!
//! ```
//! use hawkwire::wire::{Deserializer, Serializer};
//!
//! let mut s = Serializer::new();
//! s.write_var_signed(-2);
//! s.write_fixed8(123.456);
//! s.write_str("hello");
//!
//! let mut d = Deserializer::new(s.freeze());
//! assert_eq!(d.read_var_signed().unwrap(), -2);
//! assert_eq!(d.read_fixed8().unwrap(), 123.456);
//! assert_eq!(d.read_text().unwrap().as_str().unwrap(), "hello");
//! assert!(d.done().is_ok());
//! ```

mod constants;
mod deserializer;
mod serializer;
mod text;
mod varint;

pub use constants::{
    byte_list_encoded_size, decode_element_count, decode_list_length_checked,
    encode_byte_list_length, encode_list_length, list_length_encoded_size, WireType,
    CONTINUATION_FLAG, FIELDS_PER_SEGMENT, FIRST_FIELD_BIT, MAX_VARINT_LEN, TYPE_MASK,
};
pub use deserializer::Deserializer;
pub use serializer::Serializer;
pub use text::Text;
pub use varint::{
    size_of_var_signed, size_of_var_unsigned, try_decode_var_unsigned, zigzag_decode,
    zigzag_encode,
};
