//! Futures whose producer runs on first observation and never again.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;

/// The cached, clonable future shared by every observer.
pub type SharedOutcome<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

type Producer<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, E>> + Send>;

enum Slot<T, E> {
    Uninitialized(Option<Producer<T, E>>),
    Started(SharedOutcome<T, E>),
}

/// Observable lifecycle of a `LazyFuture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyState {
    /// Producer not yet invoked.
    Uninitialized,
    /// Producer invoked, outcome not yet available.
    InFlight,
    /// Outcome available (success or failure).
    Settled,
}

/// A future that starts on first observation and is shared afterwards.
///
/// At most one producer invocation happens per instance, no matter how many
/// callers race `get`. A failed outcome is cached and replayed; retrying
/// requires a new instance.
pub struct LazyFuture<T, E> {
    slot: Mutex<Slot<T, E>>,
}

impl<T, E> LazyFuture<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap a producer. Nothing runs until the first `get`.
    ///
    /// The producer is called with the internal lock held and must not
    /// observe this same `LazyFuture` synchronously.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let producer: Producer<T, E> = Box::new(move || producer().boxed());
        Self {
            slot: Mutex::new(Slot::Uninitialized(Some(producer))),
        }
    }

    /// Observe the future, starting the producer if this is the first observation.
    pub fn get(&self) -> SharedOutcome<T, E> {
        let mut slot = self.slot.lock();
        let producer = match &mut *slot {
            Slot::Started(outcome) => return outcome.clone(),
            Slot::Uninitialized(producer) => producer.take(),
        };

        let outcome = match producer {
            Some(produce) => produce().shared(),
            // Unreachable: the slot flips to Started in the same critical section.
            None => futures_util::future::pending::<Result<T, E>>()
                .boxed()
                .shared(),
        };
        *slot = Slot::Started(outcome.clone());
        outcome
    }

    pub fn state(&self) -> LazyState {
        match &*self.slot.lock() {
            Slot::Uninitialized(_) => LazyState::Uninitialized,
            Slot::Started(outcome) if outcome.peek().is_some() => LazyState::Settled,
            Slot::Started(_) => LazyState::InFlight,
        }
    }

    /// Settled outcome, if any. Never starts the producer.
    pub fn peek(&self) -> Option<Result<T, E>> {
        match &*self.slot.lock() {
            Slot::Started(outcome) => outcome.peek().cloned(),
            Slot::Uninitialized(_) => None,
        }
    }

    pub fn is_started(&self) -> bool {
        !matches!(self.state(), LazyState::Uninitialized)
    }
}
