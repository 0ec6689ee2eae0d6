//! Signed event-stream frame.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::Result;
use crate::structure::{field_bit, FieldSet, FieldSets, Segment, SizeCache, Structure};
use crate::wire::{Deserializer, Serializer, WireType};

// Slot of the LIST segment in `LAYOUT`.
const LIST: usize = 1;

const DATE: u64 = field_bit(0);
const SIGNATURE: u64 = field_bit(0);
const CHUNK: u64 = field_bit(1);

const LAYOUT: [Segment; 2] = [
    Segment::new(WireType::EightByte, 0, DATE, DATE),
    Segment::new(WireType::List, 0, SIGNATURE, SIGNATURE | CHUNK),
];

/// One frame of a signed stream: a signature over an optional encoded
/// chunk, stamped with the signing time.
///
/// The chunk is forwarded byte-for-byte; it is never decoded here.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedChunk {
    field_sets: FieldSets,
    size: SizeCache,
    date: f64,
    signature: Bytes,
    chunk: Option<Bytes>,
}

impl SignedChunk {
    pub fn new(signature: impl Into<Bytes>, date: SystemTime) -> Self {
        let mut chunk = Self::default();
        chunk.set_signature(signature);
        chunk.set_date(date);
        chunk
    }

    /// Signing time as epoch milliseconds.
    pub fn date_millis(&self) -> f64 {
        self.date
    }

    pub fn set_date_millis(&mut self, millis: f64) {
        self.date = millis;
        self.size.invalidate();
    }

    /// Signing time. Times before the epoch or out of range map to the epoch.
    pub fn date(&self) -> SystemTime {
        Duration::try_from_secs_f64(self.date / 1000.0)
            .ok()
            .and_then(|since| UNIX_EPOCH.checked_add(since))
            .unwrap_or(UNIX_EPOCH)
    }

    pub fn set_date(&mut self, date: SystemTime) {
        let millis = match date.duration_since(UNIX_EPOCH) {
            Ok(since) => duration_millis(since),
            Err(before) => -duration_millis(before.duration()),
        };
        self.set_date_millis(millis);
    }

    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    pub fn set_signature(&mut self, signature: impl Into<Bytes>) {
        self.signature = signature.into();
        self.size.invalidate();
    }

    pub fn has_chunk(&self) -> bool {
        self.field_sets.has(LIST, CHUNK)
    }

    /// The signed chunk as an encoded object, length prefix included.
    pub fn chunk(&self) -> Option<&Bytes> {
        self.chunk.as_ref().filter(|_| self.has_chunk())
    }

    pub fn set_chunk(&mut self, encoded: Bytes) {
        self.chunk = Some(encoded);
        self.field_sets.set(LIST, CHUNK, true);
        self.size.invalidate();
    }

    pub fn clear_chunk(&mut self) {
        self.chunk = None;
        self.field_sets.set(LIST, CHUNK, false);
        self.size.invalidate();
    }
}

/// Whole milliseconds stay exact; the fraction comes from sub-millisecond nanos.
fn duration_millis(duration: Duration) -> f64 {
    duration.as_secs() as f64 * 1000.0 + f64::from(duration.subsec_nanos()) / 1_000_000.0
}

impl Default for SignedChunk {
    fn default() -> Self {
        Self {
            field_sets: FieldSets::new(&LAYOUT),
            size: SizeCache::new(),
            date: 0.0,
            signature: Bytes::new(),
            chunk: None,
        }
    }
}

impl Structure for SignedChunk {
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
        match set.wire_type() {
            WireType::EightByte => 8,
            WireType::List => {
                let mut size = crate::wire::byte_list_encoded_size(self.signature.len());
                if let (Some(chunk), true) = (&self.chunk, set.has(CHUNK)) {
                    size += chunk.len();
                }
                size
            }
            WireType::Varint | WireType::FourByte => 0,
        }
    }

    fn encode_segment(&self, set: &FieldSet, s: &mut Serializer) {
        match set.wire_type() {
            WireType::EightByte => s.write_fixed8(self.date),
            WireType::List => {
                s.write_bytes(&self.signature);
                if let (Some(chunk), true) = (&self.chunk, set.has(CHUNK)) {
                    s.write_encoded_object(chunk);
                }
            }
            WireType::Varint | WireType::FourByte => {}
        }
    }

    fn decode_segment(&mut self, set: &FieldSet, d: &mut Deserializer) -> Result<()> {
        match set.wire_type() {
            WireType::EightByte => self.date = d.read_fixed8()?,
            WireType::List => {
                self.signature = d.read_bytes()?;
                self.chunk = if set.has(CHUNK) {
                    Some(d.read_object()?)
                } else {
                    None
                };
            }
            WireType::Varint | WireType::FourByte => {}
        }
        Ok(())
    }
}

crate::impl_codec_object!(SignedChunk);
