//! Error types for hawkwire.
//!
//! Codec failures (`CodecError`) abort the current encode/decode and are never
//! retried internally. Stream failures (`StreamError`) terminate the stream
//! they occur on.

use thiserror::Error;

use crate::wire::WireType;

/// Failure while encoding or decoding a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A varint ran past 10 bytes without terminating.
    #[error("Malformed varint: more than {0} continuation bytes")]
    MalformedVarint(usize),

    /// Tried to read past the end of the buffer.
    #[error("Buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },

    /// An envelope or collection declared a length that disagrees with what was consumed.
    #[error("Length mismatch: declared {declared} bytes, consumed {consumed}")]
    LengthMismatch { declared: usize, consumed: usize },

    /// A field set header carried a wire type this structure has no segment for.
    #[error("Unexpected field set type: {0}")]
    UnexpectedFieldSetType(u8),

    /// A continuation index referenced a segment the structure does not define.
    #[error("Unknown field set index {index} for {wire_type} fields")]
    UnknownFieldSetIndex { wire_type: WireType, index: u32 },

    /// Decoded presence bits do not cover the required set.
    #[error("Required {wire_type} field(s) missing in segment {index}: mask {missing:#x}")]
    RequiredFieldMissing {
        wire_type: WireType,
        index: u32,
        missing: u64,
    },

    /// A length/count tag was written with a different element scheme.
    #[error("Count scheme mismatch: expected {expected}, found {found}")]
    CountSchemeMismatch { expected: WireType, found: WireType },

    /// A string field did not hold valid UTF-8.
    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    /// Declared or computed size exceeds the configured limit.
    #[error("Payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// Bytes left over after a whole-buffer decode.
    #[error("{0} trailing bytes after decoded object")]
    TrailingBytes(usize),

    /// A varint decoded to a value wider than the field it was read into.
    #[error("Varint value {value} does not fit in {target}")]
    VarintOutOfRange { value: i64, target: &'static str },
}

/// Failure on a framed or credit-governed stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Upstream ended before a complete initial message header arrived.
    #[error("Stream ended before the initial message header ({received} bytes received)")]
    MissingInitialMessage { received: usize },

    /// Upstream ended before the initial message was fully received.
    #[error("Stream ended after {received} of {expected} initial message bytes")]
    IncompleteInitialMessage { expected: usize, received: usize },

    /// The initial message declared a length over the configured limit.
    #[error("Initial message size {size} exceeds maximum {max}")]
    InitialMessageTooLarge { size: usize, max: usize },

    /// The consumer cancelled the stream.
    #[error("Stream cancelled")]
    Cancelled,

    /// Demand must be strictly positive.
    #[error("Requested {0} items; demand must be positive")]
    InvalidDemand(usize),

    /// The other side of the stream is gone.
    #[error("Stream closed")]
    Closed,

    /// The producer terminated the stream with an error.
    #[error("Stream failed: {0}")]
    Remote(String),

    /// A reassembled message failed to decode.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Result type alias for stream operations.
pub type StreamResult<T> = std::result::Result<T, StreamError>;
