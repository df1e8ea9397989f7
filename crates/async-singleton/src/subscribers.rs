//! Callback registry with idempotent, re-entrant safe deregistration.

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Callback invoked with every delivered value.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

type Remover = Box<dyn FnOnce() + Send>;

struct Registry<T> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<T>>,
}

/// Ordered set of subscriber callbacks.
///
/// Callbacks are never invoked while the registry lock is held, so a callback
/// may subscribe, unsubscribe itself, or unsubscribe others.
///
/// Owners that publish a current value hold `delivery()` while they change
/// it and deliver it, and while they replay it to a new subscriber. Deliveries
/// across threads are then totally ordered; the guard is reentrant so a
/// callback may still publish on its own thread.
pub struct SubscriberSet<T> {
    registry: Arc<Mutex<Registry<T>>>,
    delivery: ReentrantMutex<()>,
}

impl<T: 'static> SubscriberSet<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: BTreeMap::new(),
            })),
            delivery: ReentrantMutex::new(()),
        }
    }

    /// Serialize a change-and-deliver (or insert-and-replay) sequence.
    pub fn delivery(&self) -> ReentrantMutexGuard<'_, ()> {
        self.delivery.lock()
    }

    /// Register a callback. Delivery order follows registration order.
    pub fn insert(&self, callback: Callback<T>) -> Subscription {
        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.callbacks.insert(id, callback);
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription::new(Box::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.lock().callbacks.remove(&id);
            }
        }))
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.registry.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capture the callbacks registered right now.
    pub fn snapshot(&self) -> Vec<(u64, Callback<T>)> {
        self.registry
            .lock()
            .callbacks
            .iter()
            .map(|(id, callback)| (*id, callback.clone()))
            .collect()
    }

    /// Deliver `value` to a previously captured snapshot, skipping callbacks
    /// that were removed since the snapshot was taken.
    pub fn deliver(&self, snapshot: Vec<(u64, Callback<T>)>, value: &T) {
        for (id, callback) in snapshot {
            let live = self.registry.lock().callbacks.contains_key(&id);
            if live {
                callback(value);
            }
        }
    }

    /// Deliver `value` to every current subscriber.
    pub fn emit(&self, value: &T) {
        let snapshot = self.snapshot();
        self.deliver(snapshot, value);
    }
}

impl<T: 'static> Default for SubscriberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle leaves the callback registered; call `unsubscribe` to
/// remove it. `unsubscribe` may be called any number of times, including from
/// inside the callback itself.
pub struct Subscription {
    remover: Mutex<Option<Remover>>,
}

impl Subscription {
    fn new(remover: Remover) -> Self {
        Self {
            remover: Mutex::new(Some(remover)),
        }
    }

    /// Remove the callback. Subsequent calls do nothing.
    pub fn unsubscribe(&self) {
        let remover = self.remover.lock().take();
        if let Some(remove) = remover {
            remove();
        }
    }

    /// Whether `unsubscribe` has not been called yet.
    pub fn is_active(&self) -> bool {
        self.remover.lock().is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<(char, u32)>>>, tag: char) -> Callback<u32> {
        let log = log.clone();
        Arc::new(move |value: &u32| log.lock().push((tag, *value)))
    }

    #[test]
    fn test_emit_in_registration_order() {
        let set = SubscriberSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = set.insert(recorder(&log, 'a'));
        let _b = set.insert(recorder(&log, 'b'));

        set.emit(&7);

        assert_eq!(*log.lock(), vec![('a', 7), ('b', 7)]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let set = SubscriberSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sub = set.insert(recorder(&log, 'a'));

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert!(set.is_empty());

        set.emit(&1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_unsubscribe_from_inside_callback() {
        let set = SubscriberSet::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(Mutex::new(0u32));

        let sub = set.insert({
            let slot = slot.clone();
            let calls = calls.clone();
            Arc::new(move |_: &u32| {
                *calls.lock() += 1;
                if let Some(sub) = slot.lock().as_ref() {
                    sub.unsubscribe();
                }
            })
        });
        *slot.lock() = Some(sub);

        set.emit(&1);
        set.emit(&2);

        assert_eq!(*calls.lock(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_removed_during_delivery_is_skipped() {
        let set = SubscriberSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let _first = set.insert({
            let victim = victim.clone();
            Arc::new(move |_: &u32| {
                if let Some(sub) = victim.lock().as_ref() {
                    sub.unsubscribe();
                }
            })
        });
        *victim.lock() = Some(set.insert(recorder(&log, 'b')));

        set.emit(&3);

        assert!(log.lock().is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unsubscribe_after_set_dropped() {
        let set: SubscriberSet<u32> = SubscriberSet::new();
        let sub = set.insert(Arc::new(|_: &u32| {}));
        drop(set);

        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
