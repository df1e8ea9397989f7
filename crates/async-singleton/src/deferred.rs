//! Externally settled, single-resolution values.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

struct Slot<T, E> {
    sender: Option<oneshot::Sender<Result<T, E>>>,
    outcome: Option<Result<T, E>>,
}

struct Inner<T, E> {
    slot: Mutex<Slot<T, E>>,
    outcome: Shared<BoxFuture<'static, Result<T, E>>>,
}

/// A value settled exactly once by whoever drives the underlying operation.
///
/// Clones share the same slot, so one clone can be handed to the producer
/// while others are awaited.
pub struct Deferred<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create an unsettled value.
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel::<Result<T, E>>();

        let outcome = async move {
            match rx.await {
                Ok(result) => result,
                // Dropped without settling: stays pending, like an abandoned promise.
                Err(_) => futures_util::future::pending().await,
            }
        }
        .boxed()
        .shared();

        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot {
                    sender: Some(tx),
                    outcome: None,
                }),
                outcome,
            }),
        }
    }

    /// Settle with a value. Returns false if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with an error. Returns false if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    fn settle(&self, result: Result<T, E>) -> bool {
        let mut slot = self.inner.slot.lock();
        if slot.outcome.is_some() {
            return false;
        }

        slot.outcome = Some(result.clone());
        if let Some(tx) = slot.sender.take() {
            let _ = tx.send(result);
        }
        true
    }

    pub fn is_settled(&self) -> bool {
        self.inner.slot.lock().outcome.is_some()
    }

    /// Non-suspending view of the outcome.
    pub fn peek(&self) -> Option<Result<T, E>> {
        self.inner.slot.lock().outcome.clone()
    }

    /// Wait for settlement. Every waiter receives the same outcome.
    pub fn wait(&self) -> impl Future<Output = Result<T, E>> + Send + 'static {
        self.inner.outcome.clone()
    }
}

impl<T, E> Default for Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
