//! # hawkwire
//!
//! Schema-driven binary object encoding with lazy decoding and stream framing.
//!
//! Objects are encoded without field names: each structure is a length-prefixed
//! run of presence headers ("field sets") followed by the present values,
//! grouped by wire type. Absent optional fields cost nothing, nested objects
//! can be forwarded without ever being decoded, and the first object of a
//! chunked byte stream can be reassembled however it was split.
//!
//! ## Layout
//!
//! - [`wire`]: varints, zigzag, fixed-width values, length tags
//! - [`structure`]: field sets, the structure envelope, lazy nested objects
//! - [`collections`]: typed lists and string-keyed maps
//! - [`codec`]: whole-object entry points and built-in message types
//! - [`stream`]: initial-message framing and credit-based event streams
//!
//! ## Example
//!
//! ```
//! use hawkwire::codec::ObjectCodec;
//! use hawkwire::collections::IntList;
//!
//! let list = IntList::from(vec![1, -1, 300]);
//! let encoded = ObjectCodec::serialize(&list);
//! let decoded: IntList = ObjectCodec::deserialize(encoded).unwrap();
//! assert_eq!(decoded, list);
//! ```

pub mod codec;
pub mod collections;
pub mod config;
pub mod error;
pub mod stream;
pub mod structure;
pub mod wire;

pub use codec::ObjectCodec;
pub use config::{CodecConfig, StreamConfig};
pub use error::{CodecError, StreamError};
pub use structure::{CodecObject, Lazy, Structure};
