//! Initial-message reassembly for chunked byte streams.
//!
//! A stream of arbitrarily split chunks starts with one encoded object (the
//! initial message); everything after it is opaque payload. The buffering
//! policy collects exactly that object and then gets out of the way:
//!
//! ```text
//! chunks:  [3f 01 ..] [.. .. ..] [.. | aa bb] [cc dd]
//!           \______ initial ______/   \_ passed through _/
//! ```
//!
//! State machine:
//! - `WaitingForHeader`: the length varint is not complete yet
//! - `WaitingForPayload`: total length known, need more bytes
//! - `PassThrough`: initial message emitted, chunks forwarded untouched
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use hawkwire::stream::{BufferingPolicy, FramePolicy};
//!
//! let mut policy = BufferingPolicy::new();
//! // envelope declaring a 2-byte body, split across chunks
//! assert!(policy.feed(Bytes::from_static(&[2 << 2, 0x01])).unwrap().is_empty());
//! let out = policy.feed(Bytes::from_static(&[0x02, 0xff])).unwrap();
//! assert_eq!(&out[0][..], &[2 << 2, 0x01, 0x02]);
//! assert_eq!(&out[1][..], &[0xff]);
//! ```

use bytes::{Bytes, BytesMut};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::DEFAULT_MAX_INITIAL_MESSAGE_SIZE;
use crate::error::{StreamError, StreamResult};
use crate::wire::{decode_list_length_checked, try_decode_var_unsigned, WireType};

/// How an incoming chunked stream is delivered downstream.
///
/// The first buffer a policy returns is the initial message; every later
/// buffer is forwarded as-is.
pub trait FramePolicy: Send {
    /// Accept one chunk; return zero or more buffers to deliver, in order.
    fn feed(&mut self, chunk: Bytes) -> StreamResult<Vec<Bytes>>;

    /// Input ended. Fails if the initial message was never completed.
    fn finish(&mut self) -> StreamResult<()>;

    /// Check if the initial message has been delivered.
    fn is_initial_complete(&self) -> bool;
}

/// State machine for initial-message parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Length prefix not fully received.
    WaitingForHeader,
    /// Need `target` bytes in total (prefix included).
    WaitingForPayload { target: usize },
    /// Initial message delivered.
    PassThrough,
}

/// Buffers the first encoded object until complete, then passes through.
pub struct BufferingPolicy {
    /// Accumulated bytes of the initial message.
    buffer: BytesMut,
    state: State,
    /// Maximum allowed initial message size, prefix included.
    max_message_size: usize,
}

impl BufferingPolicy {
    /// Create a policy with the default size limit (16 MiB).
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_INITIAL_MESSAGE_SIZE)
    }

    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            state: State::WaitingForHeader,
            max_message_size,
        }
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get current state name (for debugging).
    pub fn state_name(&self) -> &'static str {
        match self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
            State::PassThrough => "PassThrough",
        }
    }

    /// Advance the state machine over buffered bytes. Returns the initial
    /// message plus any surplus once complete.
    fn try_complete(&mut self) -> StreamResult<Vec<Bytes>> {
        loop {
            match self.state {
                State::WaitingForHeader => {
                    let Some((tag, prefix)) = try_decode_var_unsigned(&self.buffer)? else {
                        return Ok(Vec::new());
                    };
                    let len = decode_list_length_checked(tag, WireType::List)?;
                    let target = prefix.saturating_add(len);
                    if target > self.max_message_size {
                        return Err(StreamError::InitialMessageTooLarge {
                            size: target,
                            max: self.max_message_size,
                        });
                    }
                    self.buffer.reserve(target.saturating_sub(self.buffer.len()));
                    self.state = State::WaitingForPayload { target };
                }

                State::WaitingForPayload { target } => {
                    if self.buffer.len() < target {
                        return Ok(Vec::new());
                    }
                    let message = self.buffer.split_to(target).freeze();
                    let mut out = vec![message];
                    if !self.buffer.is_empty() {
                        out.push(self.buffer.split().freeze());
                    }
                    self.state = State::PassThrough;
                    debug!(size = target, "Initial message complete");
                    return Ok(out);
                }

                State::PassThrough => return Ok(Vec::new()),
            }
        }
    }
}

impl Default for BufferingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePolicy for BufferingPolicy {
    fn feed(&mut self, chunk: Bytes) -> StreamResult<Vec<Bytes>> {
        if self.state == State::PassThrough {
            return Ok(if chunk.is_empty() { Vec::new() } else { vec![chunk] });
        }
        self.buffer.extend_from_slice(&chunk);
        self.try_complete()
    }

    fn finish(&mut self) -> StreamResult<()> {
        match self.state {
            State::PassThrough => Ok(()),
            State::WaitingForHeader => {
                warn!(received = self.buffer.len(), "Stream ended before initial message header");
                Err(StreamError::MissingInitialMessage {
                    received: self.buffer.len(),
                })
            }
            State::WaitingForPayload { target } => {
                warn!(
                    expected = target,
                    received = self.buffer.len(),
                    "Stream ended before initial message was complete"
                );
                Err(StreamError::IncompleteInitialMessage {
                    expected: target,
                    received: self.buffer.len(),
                })
            }
        }
    }

    fn is_initial_complete(&self) -> bool {
        self.state == State::PassThrough
    }
}

/// Delivers chunks untouched; the first non-empty chunk is the initial message.
#[derive(Debug, Default)]
pub struct PassThroughPolicy {
    seen_first: bool,
}

impl PassThroughPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FramePolicy for PassThroughPolicy {
    fn feed(&mut self, chunk: Bytes) -> StreamResult<Vec<Bytes>> {
        if chunk.is_empty() {
            return Ok(Vec::new());
        }
        self.seen_first = true;
        Ok(vec![chunk])
    }

    fn finish(&mut self) -> StreamResult<()> {
        if self.seen_first {
            Ok(())
        } else {
            Err(StreamError::MissingInitialMessage { received: 0 })
        }
    }

    fn is_initial_complete(&self) -> bool {
        self.seen_first
    }
}

/// A policy plus the one-shot slot the initial message is delivered to.
///
/// The initial message (or the error that prevented it) is sent exactly
/// once; [`BufferAccumulator::feed`] only returns the buffers after it.
pub struct BufferAccumulator {
    policy: Box<dyn FramePolicy>,
    on_initial: Option<oneshot::Sender<StreamResult<Bytes>>>,
}

impl BufferAccumulator {
    pub fn new(
        policy: Box<dyn FramePolicy>,
        on_initial: oneshot::Sender<StreamResult<Bytes>>,
    ) -> Self {
        Self {
            policy,
            on_initial: Some(on_initial),
        }
    }

    /// Check if the initial message (or its failure) has been delivered.
    pub fn is_complete(&self) -> bool {
        self.on_initial.is_none()
    }

    /// Feed one chunk. Returns the buffers that follow the initial message.
    pub fn feed(&mut self, chunk: Bytes) -> StreamResult<Vec<Bytes>> {
        let mut out = match self.policy.feed(chunk) {
            Ok(out) => out.into_iter(),
            Err(e) => {
                self.fail(e.clone());
                return Err(e);
            }
        };
        if !self.is_complete() {
            if let Some(initial) = out.next() {
                self.complete(Ok(initial));
            }
        }
        Ok(out.collect())
    }

    /// Input ended. Fails the initial slot if it is still pending.
    pub fn finish(&mut self) -> StreamResult<()> {
        if self.is_complete() {
            return Ok(());
        }
        let error = match self.policy.finish() {
            Err(e) => e,
            Ok(()) => StreamError::MissingInitialMessage { received: 0 },
        };
        self.fail(error.clone());
        Err(error)
    }

    /// Deliver `error` to the initial slot if still pending.
    pub fn fail(&mut self, error: StreamError) {
        self.complete(Err(error));
    }

    fn complete(&mut self, result: StreamResult<Bytes>) {
        if let Some(tx) = self.on_initial.take() {
            // Receiver may be gone; nothing left to notify.
            let _ = tx.send(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ObjectCodec;
    use crate::collections::IntList;
    use crate::structure::CodecObject;

    /// An encoded 3-byte message: prefix (body 2) + 2 body bytes.
    const MESSAGE: [u8; 3] = [2 << 2, 0x09, 0x02];

    fn feed_all(policy: &mut BufferingPolicy, chunks: &[&[u8]]) -> Vec<Vec<Bytes>> {
        chunks
            .iter()
            .map(|chunk| policy.feed(Bytes::copy_from_slice(chunk)).unwrap())
            .collect()
    }

    #[test]
    fn test_whole_message_in_one_chunk() {
        let mut policy = BufferingPolicy::new();
        let out = policy.feed(Bytes::from_static(&MESSAGE)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(&out[0][..], &MESSAGE);
        assert!(policy.is_initial_complete());
        assert!(policy.is_empty());
    }

    #[test]
    fn test_split_one_two() {
        let mut policy = BufferingPolicy::new();
        let outputs = feed_all(&mut policy, &[&MESSAGE[..1], &MESSAGE[1..]]);
        assert!(outputs[0].is_empty());
        assert_eq!(policy.state_name(), "PassThrough");
        assert_eq!(&outputs[1][0][..], &MESSAGE);
    }

    #[test]
    fn test_split_byte_by_byte() {
        let mut policy = BufferingPolicy::new();
        let outputs = feed_all(&mut policy, &[&MESSAGE[..1], &MESSAGE[1..2], &MESSAGE[2..]]);
        assert!(outputs[0].is_empty());
        assert!(outputs[1].is_empty());
        assert_eq!(outputs[2].len(), 1);
        assert_eq!(&outputs[2][0][..], &MESSAGE);
    }

    #[test]
    fn test_split_length_varint() {
        // 200-byte body needs a two-byte prefix
        let list = IntList::from(vec![0; 199]);
        let encoded = ObjectCodec::serialize(&list);
        assert_eq!(list.size(), 201);

        let mut policy = BufferingPolicy::new();
        assert!(policy.feed(encoded.slice(..1)).unwrap().is_empty());
        assert_eq!(policy.state_name(), "WaitingForHeader");
        assert!(policy.feed(encoded.slice(1..50)).unwrap().is_empty());
        assert_eq!(policy.state_name(), "WaitingForPayload");
        let out = policy.feed(encoded.slice(50..)).unwrap();
        assert_eq!(out, vec![encoded]);
    }

    #[test]
    fn test_surplus_and_later_chunks_pass_through() {
        let mut policy = BufferingPolicy::new();
        let mut first = MESSAGE.to_vec();
        first.extend_from_slice(b"tail");
        let out = policy.feed(Bytes::from(first)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(&out[0][..], &MESSAGE);
        assert_eq!(&out[1][..], b"tail");

        let later = Bytes::from_static(b"more");
        let out = policy.feed(later.clone()).unwrap();
        assert_eq!(out, vec![later.clone()]);
        // forwarded without copying
        assert_eq!(out[0].as_ptr(), later.as_ptr());
    }

    #[test]
    fn test_too_large_rejected() {
        let mut policy = BufferingPolicy::with_max_message_size(2);
        assert_eq!(
            policy.feed(Bytes::from_static(&MESSAGE)).unwrap_err(),
            StreamError::InitialMessageTooLarge { size: 3, max: 2 }
        );
    }

    #[test]
    fn test_finish_reports_progress() {
        let mut policy = BufferingPolicy::new();
        assert_eq!(
            policy.finish().unwrap_err(),
            StreamError::MissingInitialMessage { received: 0 }
        );
        policy.feed(Bytes::from_static(&MESSAGE[..2])).unwrap();
        assert_eq!(
            policy.finish().unwrap_err(),
            StreamError::IncompleteInitialMessage {
                expected: 3,
                received: 2,
            }
        );
    }

    #[test]
    fn test_pass_through_policy() {
        let mut policy = PassThroughPolicy::new();
        assert!(policy.feed(Bytes::new()).unwrap().is_empty());
        assert!(policy.finish().is_err());
        let out = policy.feed(Bytes::from_static(&MESSAGE[..1])).unwrap();
        assert_eq!(&out[0][..], &MESSAGE[..1]);
        assert!(policy.is_initial_complete());
        assert!(policy.finish().is_ok());
    }

    #[test]
    fn test_accumulator_delivers_once() {
        for splits in [vec![3], vec![1, 2], vec![1, 1, 1]] {
            let (tx, mut rx) = oneshot::channel();
            let mut acc = BufferAccumulator::new(Box::new(BufferingPolicy::new()), tx);
            let mut rest = Vec::new();
            let mut offset = 0;
            for len in splits {
                let chunk = Bytes::copy_from_slice(&MESSAGE[offset..offset + len]);
                offset += len;
                rest.extend(acc.feed(chunk).unwrap());
            }
            rest.extend(acc.feed(Bytes::from_static(b"x")).unwrap());

            assert!(acc.is_complete());
            assert_eq!(&rx.try_recv().unwrap().unwrap()[..], &MESSAGE);
            assert_eq!(rest, vec![Bytes::from_static(b"x")]);
            assert!(acc.finish().is_ok());
        }
    }

    #[test]
    fn test_accumulator_reports_early_end() {
        let (tx, mut rx) = oneshot::channel();
        let mut acc = BufferAccumulator::new(Box::new(BufferingPolicy::new()), tx);
        acc.feed(Bytes::from_static(&MESSAGE[..2])).unwrap();
        assert!(acc.finish().is_err());
        assert_eq!(
            rx.try_recv().unwrap().unwrap_err(),
            StreamError::IncompleteInitialMessage {
                expected: 3,
                received: 2,
            }
        );
    }
}
