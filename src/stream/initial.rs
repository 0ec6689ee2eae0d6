//! Splitting a chunked stream into its initial message and the rest.
//!
//! ```text
//! upstream mpsc ─► splitter task ─► BufferAccumulator ─┬─► InitialMessage (oneshot)
//!                                                      └─► EventStream (credit-governed)
//! ```

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::codec::ObjectCodec;
use crate::config::StreamConfig;
use crate::error::{StreamError, StreamResult};
use crate::structure::CodecObject;

use super::event::{event_channel, EventSender, EventStream};
use super::frame_buffer::{BufferAccumulator, BufferingPolicy, FramePolicy, PassThroughPolicy};

/// The first message of a split stream, resolved once it has arrived.
#[derive(Debug)]
pub struct InitialMessage {
    rx: oneshot::Receiver<StreamResult<Bytes>>,
}

impl InitialMessage {
    /// Wait for the raw initial message.
    pub async fn bytes(self) -> StreamResult<Bytes> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(StreamError::Closed),
        }
    }

    /// Wait for the initial message and decode it as `T`.
    pub async fn decode<T: CodecObject + Default>(self) -> StreamResult<T> {
        let bytes = self.bytes().await?;
        ObjectCodec::deserialize(bytes).map_err(|e| {
            error!(error = %e, "Initial message failed to decode");
            StreamError::from(e)
        })
    }
}

/// Both halves of a split stream.
#[derive(Debug)]
pub struct SplitStream {
    pub initial: InitialMessage,
    pub events: EventStream,
}

/// Spawn a task splitting `upstream` into its initial message and the
/// buffers that follow it.
///
/// With `buffer_initial_message` set, the initial message is reassembled from
/// however many chunks it spans; otherwise the first chunk is taken as-is.
/// The remaining buffers are forwarded under the stream's credit. Dropping
/// the event stream stops the task and drops `upstream`.
///
/// Must be called from within a tokio runtime.
pub fn split_initial_message(upstream: mpsc::Receiver<Bytes>, config: &StreamConfig) -> SplitStream {
    let (initial_tx, initial_rx) = oneshot::channel();
    let (sender, events) = event_channel(config.initial_credit);

    let policy: Box<dyn FramePolicy> = if config.buffer_initial_message {
        Box::new(BufferingPolicy::with_max_message_size(
            config.max_initial_message_size,
        ))
    } else {
        Box::new(PassThroughPolicy::new())
    };
    let accumulator = BufferAccumulator::new(policy, initial_tx);

    debug!(
        buffered = config.buffer_initial_message,
        initial_credit = config.initial_credit,
        "Splitting initial message from stream"
    );
    tokio::spawn(splitter_loop(upstream, accumulator, sender));

    SplitStream {
        initial: InitialMessage { rx: initial_rx },
        events,
    }
}

/// Main splitter loop - feeds chunks through the accumulator and forwards the rest.
async fn splitter_loop(
    mut upstream: mpsc::Receiver<Bytes>,
    mut accumulator: BufferAccumulator,
    sender: EventSender,
) {
    loop {
        let chunk = tokio::select! {
            chunk = upstream.recv() => chunk,
            _ = sender.cancelled() => {
                warn!("Stream cancelled by consumer");
                accumulator.fail(StreamError::Cancelled);
                return;
            }
        };

        let Some(chunk) = chunk else {
            // Upstream done: complete, or fail both halves if the initial
            // message never arrived.
            match accumulator.finish() {
                Ok(()) => sender.complete(),
                Err(e) => sender.fail(e),
            }
            return;
        };

        let buffers = match accumulator.feed(chunk) {
            Ok(buffers) => buffers,
            Err(e) => {
                sender.fail(e);
                return;
            }
        };

        for buffer in buffers {
            if let Err(e) = sender.send(buffer).await {
                warn!(error = %e, "Dropping remaining stream buffers");
                accumulator.fail(StreamError::Cancelled);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FrameworkError;

    fn config(buffer_initial_message: bool) -> StreamConfig {
        StreamConfig {
            buffer_initial_message,
            ..StreamConfig::default()
        }
    }

    #[tokio::test]
    async fn test_split_reassembles_initial_message() {
        let message = ObjectCodec::serialize(&FrameworkError::new("initial request"));
        let (tx, rx) = mpsc::channel(8);
        let split = split_initial_message(rx, &config(true));

        tx.send(message.slice(..1)).await.unwrap();
        tx.send(message.slice(1..4)).await.unwrap();
        let mut last = message.slice(4..).to_vec();
        last.extend_from_slice(b"payload-1");
        tx.send(Bytes::from(last)).await.unwrap();
        tx.send(Bytes::from_static(b"payload-2")).await.unwrap();
        drop(tx);

        let initial: FrameworkError = split.initial.decode().await.unwrap();
        assert_eq!(initial.message().unwrap(), Some("initial request"));

        let rest = split.events.collect().await.unwrap();
        assert_eq!(
            rest,
            vec![
                Bytes::from_static(b"payload-1"),
                Bytes::from_static(b"payload-2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_unbuffered_takes_first_chunk() {
        let (tx, rx) = mpsc::channel(8);
        let split = split_initial_message(rx, &config(false));
        tx.send(Bytes::from_static(b"first")).await.unwrap();
        tx.send(Bytes::from_static(b"second")).await.unwrap();
        drop(tx);

        assert_eq!(&split.initial.bytes().await.unwrap()[..], b"first");
        let rest = split.events.collect().await.unwrap();
        assert_eq!(rest, vec![Bytes::from_static(b"second")]);
    }

    #[tokio::test]
    async fn test_early_end_fails_both_halves() {
        let (tx, rx) = mpsc::channel(8);
        let split = split_initial_message(rx, &config(true));
        tx.send(Bytes::from_static(&[10 << 2, 0x08])).await.unwrap();
        drop(tx);

        assert_eq!(
            split.initial.bytes().await.unwrap_err(),
            StreamError::IncompleteInitialMessage {
                expected: 11,
                received: 2,
            }
        );
        assert!(split.events.collect().await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_initial_message() {
        let config = StreamConfig {
            max_initial_message_size: 4,
            ..StreamConfig::default()
        };
        let (tx, rx) = mpsc::channel(8);
        let split = split_initial_message(rx, &config);
        tx.send(Bytes::from_static(&[10 << 2])).await.unwrap();

        assert_eq!(
            split.initial.bytes().await.unwrap_err(),
            StreamError::InitialMessageTooLarge { size: 11, max: 4 }
        );
    }

    #[tokio::test]
    async fn test_consumer_drop_releases_upstream() {
        let (tx, rx) = mpsc::channel(8);
        let split = split_initial_message(rx, &config(true));
        drop(split.events);

        tx.closed().await;
        assert_eq!(
            split.initial.bytes().await.unwrap_err(),
            StreamError::Cancelled
        );
    }

    #[tokio::test]
    async fn test_credit_limits_forwarding() {
        let config = StreamConfig {
            initial_credit: 1,
            ..StreamConfig::default()
        };
        let (tx, rx) = mpsc::channel(8);
        let SplitStream { initial, mut events } = split_initial_message(rx, &config);
        tx.send(Bytes::from_static(&[0])).await.unwrap();
        tx.send(Bytes::from_static(b"a")).await.unwrap();
        tx.send(Bytes::from_static(b"b")).await.unwrap();
        drop(tx);

        assert_eq!(&initial.bytes().await.unwrap()[..], &[0]);
        assert_eq!(&events.next().await.unwrap().unwrap()[..], b"a");
        events.request(1).unwrap();
        assert_eq!(&events.next().await.unwrap().unwrap()[..], b"b");
        assert!(events.next().await.is_none());
    }
}
