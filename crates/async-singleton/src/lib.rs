//! Lazy, memoized, multi-subscriber async values.
//!
//! This crate provides:
//! - `Deferred`: a single-resolution value settled from outside
//! - `LazyFuture`: a shared future whose producer runs at most once, on first observation
//! - `SharedAsyncResource`: a singleton accessor with snapshot reads, replaying
//!   subscriptions and a side channel for pushing later values
//! - `SubscriberSet`: the callback registry behind the two above

mod deferred;
mod lazy;
mod resource;
mod subscribers;

pub use deferred::Deferred;
pub use lazy::{LazyFuture, LazyState, SharedOutcome};
pub use resource::{SharedAsyncResource, Updater};
pub use subscribers::{Callback, SubscriberSet, Subscription};
