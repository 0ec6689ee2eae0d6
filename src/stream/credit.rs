//! Consumer-granted credit for event streams.
//!
//! A producer may only emit an element while it holds credit; the consumer
//! grants credit with [`CreditController::grant`]. Credit is backed by a
//! `tokio::sync::Semaphore`, so a producer with no credit parks until the
//! consumer asks for more or cancels.
//!
//! # Usage
//!
//! The [`CreditController`] is shared between an
//! [`EventSender`](super::EventSender) and its
//! [`EventStream`](super::EventStream). Cloning shares the same credit pool.

use std::sync::Arc;

use tokio::sync::{Semaphore, TryAcquireError};

use crate::config::DEFAULT_INITIAL_CREDIT;
use crate::error::{StreamError, StreamResult};

/// Shared credit pool for one stream.
#[derive(Debug, Clone)]
pub struct CreditController {
    permits: Arc<Semaphore>,
}

impl CreditController {
    /// Create a pool holding `initial` credits.
    pub fn new(initial: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(initial.min(Semaphore::MAX_PERMITS))),
        }
    }

    /// Grant `n` more credits. Grants past the semaphore's ceiling saturate.
    pub fn grant(&self, n: usize) -> StreamResult<()> {
        if n == 0 {
            return Err(StreamError::InvalidDemand(n));
        }
        if self.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        let headroom = Semaphore::MAX_PERMITS.saturating_sub(self.permits.available_permits());
        self.permits.add_permits(n.min(headroom));
        Ok(())
    }

    /// Take one credit, waiting until one is granted.
    pub async fn acquire(&self) -> StreamResult<()> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| StreamError::Cancelled)?;
        permit.forget();
        Ok(())
    }

    /// Take one credit if available, without waiting.
    ///
    /// Returns `Ok(false)` when out of credit.
    pub fn try_acquire(&self) -> StreamResult<bool> {
        match self.permits.try_acquire() {
            Ok(permit) => {
                permit.forget();
                Ok(true)
            }
            Err(TryAcquireError::NoPermits) => Ok(false),
            Err(TryAcquireError::Closed) => Err(StreamError::Cancelled),
        }
    }

    /// Credits currently available.
    #[inline]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Cancel: wakes every waiting producer with `Cancelled`.
    pub fn cancel(&self) {
        self.permits.close();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.permits.is_closed()
    }
}

impl Default for CreditController {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CREDIT)
    }
}
