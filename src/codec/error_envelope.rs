//! Wrapper carrying an encoded error object and its type identifier.

use bytes::Bytes;

use crate::error::Result;
use crate::structure::{field_bit, CodecObject, FieldSet, FieldSets, Segment, SizeCache, Structure};
use crate::wire::{Deserializer, Serializer, Text, WireType};

const ERROR_TYPE: u64 = field_bit(0);
const SERIALIZED_ERROR: u64 = field_bit(1);

const LAYOUT: [Segment; 1] = [Segment::new(
    WireType::List,
    0,
    ERROR_TYPE | SERIALIZED_ERROR,
    ERROR_TYPE | SERIALIZED_ERROR,
)];

/// An error as it crosses the wire: `error_type` names the schema of
/// `serialized_error`, which is an encoded object kept byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEnvelope {
    field_sets: FieldSets,
    size: SizeCache,
    error_type: Text,
    serialized_error: Bytes,
}

/// Encoding of an object with no fields: a zero body length.
const EMPTY_OBJECT: &[u8] = &[0];

impl ErrorEnvelope {
    /// Wrap an already encoded error object (length prefix included).
    pub fn new(error_type: impl Into<Text>, serialized_error: Bytes) -> Self {
        let mut envelope = Self::default();
        envelope.set_error_type(error_type);
        envelope.set_serialized_error(serialized_error);
        envelope
    }

    pub fn error_type(&self) -> Result<&str> {
        self.error_type.as_str()
    }

    pub fn set_error_type(&mut self, error_type: impl Into<Text>) {
        self.error_type = error_type.into();
        self.size.invalidate();
    }

    /// The encoded error object, length prefix included.
    pub fn serialized_error(&self) -> &Bytes {
        &self.serialized_error
    }

    pub fn set_serialized_error(&mut self, serialized_error: Bytes) {
        self.serialized_error = serialized_error;
        self.size.invalidate();
    }

    /// Decode the wrapped error object as `T`.
    pub fn decode_error<T: CodecObject + Default>(&self) -> Result<T> {
        super::ObjectCodec::deserialize(self.serialized_error.clone())
    }
}

impl Default for ErrorEnvelope {
    fn default() -> Self {
        Self {
            field_sets: FieldSets::new(&LAYOUT),
            size: SizeCache::new(),
            error_type: Text::default(),
            serialized_error: Bytes::from_static(EMPTY_OBJECT),
        }
    }
}

impl Structure for ErrorEnvelope {
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

    fn segment_size(&self, _set: &FieldSet) -> usize {
        self.error_type.encoded_size() + self.serialized_error.len()
    }

    fn encode_segment(&self, _set: &FieldSet, s: &mut Serializer) {
        s.write_text(&self.error_type);
        s.write_encoded_object(&self.serialized_error);
    }

    fn decode_segment(&mut self, _set: &FieldSet, d: &mut Deserializer) -> Result<()> {
        self.error_type = d.read_text()?;
        self.serialized_error = d.read_object()?;
        Ok(())
    }
}

crate::impl_codec_object!(ErrorEnvelope);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FrameworkError, ObjectCodec};
    use crate::error::CodecError;

    #[test]
    fn test_serialized_error_kept_verbatim() {
        let inner = ObjectCodec::serialize(&FrameworkError::new("denied"));
        let envelope = ErrorEnvelope::new("AccessDenied", inner.clone());
        let decoded: ErrorEnvelope =
            ObjectCodec::deserialize(ObjectCodec::serialize(&envelope)).unwrap();

        assert_eq!(decoded.error_type().unwrap(), "AccessDenied");
        assert_eq!(decoded.serialized_error(), &inner);
        let error: FrameworkError = decoded.decode_error().unwrap();
        assert_eq!(error.message().unwrap(), Some("denied"));
    }

    #[test]
    fn test_default_encodes_required_fields() {
        let envelope = ErrorEnvelope::default();
        let bytes = ObjectCodec::serialize(&envelope);
        // prefix, header with both bits, empty string, empty object
        assert_eq!(&bytes[..], &[3 << 2, 0x18, 0, 0]);
        let decoded: ErrorEnvelope = ObjectCodec::deserialize(bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_missing_serialized_error_rejected() {
        // header with only the type bit, then a string
        let bytes = Bytes::from_static(&[3 << 2, 0x08, 1 << 2, b'x']);
        let err = ObjectCodec::deserialize::<ErrorEnvelope>(bytes).unwrap_err();
        assert_eq!(
            err,
            CodecError::RequiredFieldMissing {
                wire_type: WireType::List,
                index: 0,
                missing: SERIALIZED_ERROR,
            }
        );
    }
}
