//! Whole-buffer encode/decode entry points.

use bytes::Bytes;
use tracing::debug;

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::structure::CodecObject;
use crate::wire::{Deserializer, Serializer, Text};

use super::{ErrorEnvelope, FrameworkError};

/// Codec for self-delimiting encoded objects.
///
/// Serialization pre-sizes the output buffer from the object's cached size,
/// so a well-formed object is written with exactly one allocation.
pub struct ObjectCodec;

impl ObjectCodec {
    /// Encode `value`, length prefix included.
    pub fn serialize<T: CodecObject + ?Sized>(value: &T) -> Bytes {
        let mut s = Serializer::with_capacity(value.encoded_size());
        value.encode_to(&mut s);
        s.freeze()
    }

    /// Encode `value`, refusing bodies over `config.max_payload_size`.
    pub fn serialize_with_config<T: CodecObject + ?Sized>(
        value: &T,
        config: &CodecConfig,
    ) -> Result<Bytes> {
        let size = value.size();
        if size > config.max_payload_size {
            return Err(CodecError::PayloadTooLarge {
                size,
                max: config.max_payload_size,
            });
        }
        Ok(Self::serialize(value))
    }

    /// Decode one object that must span the whole buffer.
    pub fn deserialize<T: CodecObject + Default>(buf: Bytes) -> Result<T> {
        Self::decode_all(Deserializer::new(buf))
    }

    /// Like [`ObjectCodec::deserialize`], with configured limits.
    pub fn deserialize_with_config<T: CodecObject + Default>(
        buf: Bytes,
        config: &CodecConfig,
    ) -> Result<T> {
        Self::decode_all(Deserializer::with_config(buf, config))
    }

    /// Decode from a borrowed slice (copies once).
    pub fn deserialize_slice<T: CodecObject + Default>(data: &[u8]) -> Result<T> {
        Self::decode_all(Deserializer::from_slice(data))
    }

    fn decode_all<T: CodecObject + Default>(mut d: Deserializer) -> Result<T> {
        let mut value = T::default();
        value.decode_from(&mut d)?;
        d.done()?;
        Ok(value)
    }

    /// Encode an error object wrapped in an [`ErrorEnvelope`] tagged with
    /// `error_type`.
    pub fn encode_exception<E: CodecObject + ?Sized>(
        error_type: impl Into<Text>,
        error: &E,
    ) -> Bytes {
        let envelope = ErrorEnvelope::new(error_type, Self::serialize(error));
        Self::serialize(&envelope)
    }

    /// A codec-level error carrying only a message.
    pub fn synthetic_error(message: impl Into<Text>) -> FrameworkError {
        let error = FrameworkError::new(message);
        debug!(size = error.size(), "Built synthetic error");
        error
    }
}
