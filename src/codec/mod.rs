//! Codec module - whole-object encoding and the built-in message types.
//!
//! - [`ObjectCodec`] - serialize/deserialize any [`CodecObject`](crate::structure::CodecObject)
//! - [`ErrorEnvelope`] - an encoded error object tagged with its type
//! - [`FrameworkError`] - error raised by the codec layer itself
//! - [`SignedChunk`] - signed event-stream frame
//! - [`OptionalObject`] - wrapper for an optional, lazily decoded payload
//!
//! # Design
//!
//! Codecs are implemented as marker structs with static methods rather than trait objects.
//! The concrete type to decode is always chosen by the caller at compile time.
//!
//! # Example
//!
//! ```
//! use hawkwire::codec::{FrameworkError, ObjectCodec};
//!
//! let error = FrameworkError::new("hello");
//! let encoded = ObjectCodec::serialize(&error);
//! let decoded: FrameworkError = ObjectCodec::deserialize(encoded).unwrap();
//! assert_eq!(decoded.message().unwrap(), Some("hello"));
//! ```

mod error_envelope;
mod framework_error;
mod object_codec;
mod optional;
mod signed_chunk;

pub use error_envelope::ErrorEnvelope;
pub use framework_error::FrameworkError;
pub use object_codec::ObjectCodec;
pub use optional::OptionalObject;
pub use signed_chunk::SignedChunk;
