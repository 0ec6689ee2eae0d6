//! Synthetic error raised by the codec layer itself.

use crate::error::Result;
use crate::structure::{field_bit, FieldSet, FieldSets, Segment, SizeCache, Structure};
use crate::wire::{Deserializer, Serializer, Text, WireType};

const LIST: usize = 0;
const MESSAGE: u64 = field_bit(0);

const LAYOUT: [Segment; 1] = [Segment::new(WireType::List, 0, 0, MESSAGE)];

/// Error with an optional human-readable message.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameworkError {
    field_sets: FieldSets,
    size: SizeCache,
    message: Option<Text>,
}

impl FrameworkError {
    /// Error carrying `message`.
    pub fn new(message: impl Into<Text>) -> Self {
        let mut error = Self::default();
        error.set_message(message);
        error
    }

    pub fn has_message(&self) -> bool {
        self.field_sets.has(LIST, MESSAGE)
    }

    pub fn message(&self) -> Result<Option<&str>> {
        match &self.message {
            Some(message) if self.has_message() => message.as_str().map(Some),
            _ => Ok(None),
        }
    }

    pub fn set_message(&mut self, message: impl Into<Text>) {
        self.message = Some(message.into());
        self.field_sets.set(LIST, MESSAGE, true);
        self.size.invalidate();
    }

    pub fn clear_message(&mut self) {
        self.message = None;
        self.field_sets.set(LIST, MESSAGE, false);
        self.size.invalidate();
    }
}

impl Default for FrameworkError {
    fn default() -> Self {
        Self {
            field_sets: FieldSets::new(&LAYOUT),
            size: SizeCache::new(),
            message: None,
        }
    }
}

impl Structure for FrameworkError {
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
        match (&self.message, set.has(MESSAGE)) {
            (Some(message), true) => message.encoded_size(),
            _ => 0,
        }
    }

    fn encode_segment(&self, set: &FieldSet, s: &mut Serializer) {
        if let (Some(message), true) = (&self.message, set.has(MESSAGE)) {
            s.write_text(message);
        }
    }

    fn decode_segment(&mut self, set: &FieldSet, d: &mut Deserializer) -> Result<()> {
        if set.has(MESSAGE) {
            self.message = Some(d.read_text()?);
        }
        Ok(())
    }
}

crate::impl_codec_object!(FrameworkError);
