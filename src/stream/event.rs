//! Credit-governed event streams.
//!
//! # Architecture
//!
//! ```text
//! Producer ─► EventSender ─► (one credit per element) ─► mpsc ─► EventStream ─► Consumer
//!                   ▲                                                 │
//!                   └──────────── request(n) / cancel() ◄────────────┘
//! ```
//!
//! The channel itself is unbounded; the credit pool is what bounds the number
//! of elements in flight. Errors and completion do not consume credit.

use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::codec::ObjectCodec;
use crate::error::{StreamError, StreamResult};
use crate::structure::CodecObject;

use super::credit::CreditController;

/// Create a connected sender/stream pair holding `initial_credit` credits.
pub fn event_channel(initial_credit: usize) -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let credit = CreditController::new(initial_credit);
    (
        EventSender {
            tx,
            credit: credit.clone(),
        },
        EventStream {
            rx,
            credit,
            terminated: false,
        },
    )
}

/// Producer side. Dropping it completes the stream.
#[derive(Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<StreamResult<Bytes>>,
    credit: CreditController,
}

impl EventSender {
    /// Emit one element, waiting for credit.
    ///
    /// Returns `Cancelled` once the consumer has cancelled or gone away.
    pub async fn send(&self, item: Bytes) -> StreamResult<()> {
        self.credit.acquire().await?;
        self.tx.send(Ok(item)).map_err(|_| StreamError::Cancelled)
    }

    /// Encode and emit one event.
    ///
    /// The event is encoded before the returned future is created, so the
    /// future does not borrow it and stays `Send`.
    pub fn send_event<T: CodecObject + ?Sized>(
        &self,
        event: &T,
    ) -> impl Future<Output = StreamResult<()>> + Send + '_ {
        self.send(ObjectCodec::serialize(event))
    }

    /// Terminate the stream with `error`. No credit is needed.
    pub fn fail(self, error: StreamError) {
        warn!(%error, "Event stream failed");
        // Consumer may already be gone.
        let _ = self.tx.send(Err(error));
    }

    /// Complete the stream normally.
    pub fn complete(self) {
        debug!("Event stream complete");
    }

    /// Check if the consumer has cancelled or dropped the stream.
    pub fn is_cancelled(&self) -> bool {
        self.credit.is_cancelled() || self.tx.is_closed()
    }

    /// Wait until the consumer cancels or drops the stream.
    pub async fn cancelled(&self) {
        self.tx.closed().await;
    }

    /// Credits currently available to this producer.
    pub fn credit(&self) -> usize {
        self.credit.available()
    }
}

/// Consumer side. Dropping it cancels the producer.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<StreamResult<Bytes>>,
    credit: CreditController,
    terminated: bool,
}

impl EventStream {
    /// Grant the producer `n` more elements. `n` must be positive.
    pub fn request(&self, n: usize) -> StreamResult<()> {
        self.credit.grant(n)
    }

    /// Next element, `None` once the stream completed or failed.
    ///
    /// A failure is yielded once as `Some(Err(_))`; the stream is over after it.
    pub async fn next(&mut self) -> Option<StreamResult<Bytes>> {
        if self.terminated {
            return None;
        }
        match self.rx.recv().await {
            Some(Ok(item)) => Some(Ok(item)),
            Some(Err(e)) => {
                self.terminate();
                Some(Err(e))
            }
            None => {
                self.terminated = true;
                None
            }
        }
    }

    /// Next element decoded as `T`.
    pub async fn next_event<T: CodecObject + Default>(&mut self) -> Option<StreamResult<T>> {
        let item = match self.next().await? {
            Ok(item) => item,
            Err(e) => return Some(Err(e)),
        };
        Some(ObjectCodec::deserialize(item).map_err(StreamError::from))
    }

    /// Drain every remaining element. Stops at the first failure.
    ///
    /// Credit is not granted automatically; request enough beforehand.
    pub async fn collect(mut self) -> StreamResult<Vec<Bytes>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }

    /// Stop the stream. The producer sees `Cancelled` on its next send.
    pub fn cancel(&mut self) {
        if !self.terminated {
            debug!("Event stream cancelled by consumer");
        }
        self.terminate();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.credit.cancel();
        self.rx.close();
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.credit.cancel();
    }
}
