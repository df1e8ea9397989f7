//! Singleton accessor over a lazily resolved async value.
//!
//! A `SharedAsyncResource` is read from many call sites. Reading is passive
//! (never starts work); subscribing expresses interest and starts the backing
//! `LazyFuture` if nobody has yet. The factory receives an `Updater` so it can
//! push later values (for example after a re-authentication) to every
//! subscriber, not only the first resolution.

use crate::lazy::LazyFuture;
use crate::subscribers::{SubscriberSet, Subscription};
use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};

struct ResourceState<T> {
    name: String,
    current: Mutex<Option<T>>,
    subscribers: SubscriberSet<T>,
}

impl<T> ResourceState<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Store `value` and broadcast it. Unchanged values are not re-delivered.
    fn publish(&self, value: T) -> bool {
        let _delivery = self.subscribers.delivery();
        let snapshot = {
            let mut current = self.current.lock();
            if current.as_ref() == Some(&value) {
                return false;
            }
            *current = Some(value.clone());
            self.subscribers.snapshot()
        };

        debug!(
            resource = %self.name,
            subscribers = snapshot.len(),
            "Shared resource value changed"
        );
        self.subscribers.deliver(snapshot, &value);
        true
    }
}

/// Side channel handed to the factory for pushing updated values.
pub struct Updater<T> {
    state: Weak<ResourceState<T>>,
}

impl<T> Clone for Updater<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Updater<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Replace the current value and notify subscribers.
    ///
    /// Returns false if the value is unchanged or the resource is gone.
    pub fn push(&self, value: T) -> bool {
        match self.state.upgrade() {
            Some(state) => state.publish(value),
            None => false,
        }
    }
}

/// Lazily resolved, application-wide async value.
pub struct SharedAsyncResource<T, E> {
    state: Arc<ResourceState<T>>,
    resolution: Arc<LazyFuture<T, E>>,
    driving: Arc<AtomicBool>,
}

impl<T, E> Clone for SharedAsyncResource<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            resolution: self.resolution.clone(),
            driving: self.driving.clone(),
        }
    }
}

impl<T, E> SharedAsyncResource<T, E>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    E: Clone + Display + Send + Sync + 'static,
{
    /// Create a resource backed by `factory`. The factory runs at most once,
    /// on the first subscribe or explicit `resolve`.
    pub fn new<F, Fut>(name: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce(Updater<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let state = Arc::new(ResourceState {
            name: name.into(),
            current: Mutex::new(None),
            subscribers: SubscriberSet::new(),
        });

        let weak = Arc::downgrade(&state);
        let resolution = LazyFuture::new(move || {
            let updater = Updater {
                state: weak.clone(),
            };
            let produced = factory(updater);

            async move {
                let result = produced.await;
                if let Some(state) = weak.upgrade() {
                    match &result {
                        Ok(value) => {
                            state.publish(value.clone());
                        }
                        Err(error) => {
                            error!(
                                resource = %state.name,
                                error = %error,
                                "Failed to retrieve initial value for shared resource"
                            );
                        }
                    }
                }
                result
            }
        });

        Self {
            state,
            resolution: Arc::new(resolution),
            driving: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Resource whose factory first waits for `parent` to resolve.
    ///
    /// A parent failure becomes this resource's failure.
    pub fn derived<P, F, Fut>(name: impl Into<String>, parent: &SharedAsyncResource<P, E>, f: F) -> Self
    where
        P: Clone + PartialEq + Send + Sync + 'static,
        F: FnOnce(P, Updater<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let parent = parent.clone();
        Self::new(name, move |updater| async move {
            let value = parent.resolve().await?;
            f(value, updater).await
        })
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Current value, if resolved. Never starts the factory.
    pub fn read(&self) -> Option<T> {
        self.state.current.lock().clone()
    }

    /// Register `callback` for every value change.
    ///
    /// If a value is already present it is replayed synchronously before this
    /// returns. A value pushed concurrently is delivered after the replay,
    /// never before it. The first subscription starts the factory in the
    /// background. Failures are logged and never delivered to subscribers.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Arc<dyn Fn(&T) + Send + Sync> = Arc::new(callback);

        let subscription = {
            let _delivery = self.state.subscribers.delivery();
            let (subscription, replay) = {
                let current = self.state.current.lock();
                let subscription = self.state.subscribers.insert(callback.clone());
                (subscription, current.clone())
            };

            if let Some(value) = replay {
                callback(&value);
            }
            subscription
        };

        self.drive();
        subscription
    }

    /// Wait for a value. Explicit awaiters observe failures.
    ///
    /// Once a value is present (initial or pushed) it is returned immediately.
    pub fn resolve(&self) -> BoxFuture<'static, Result<T, E>> {
        if let Some(value) = self.read() {
            return futures_util::future::ready(Ok(value)).boxed();
        }
        self.resolution.get().boxed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.subscribers.len()
    }

    /// Whether the factory has been started.
    pub fn is_started(&self) -> bool {
        self.resolution.is_started()
    }

    fn drive(&self) {
        if self.driving.swap(true, Ordering::SeqCst) {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let outcome = self.resolution.get();
                debug!(resource = %self.state.name, "Starting shared resource on first subscription");
                handle.spawn(async move {
                    let _ = outcome.await;
                });
            }
            Err(_) => {
                warn!(
                    resource = %self.state.name,
                    "No async runtime available; resource resolves when awaited"
                );
                self.driving.store(false, Ordering::SeqCst);
            }
        }
    }
}
