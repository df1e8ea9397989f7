use async_singleton::{Deferred, SharedAsyncResource, Updater};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_subscribers_one_factory_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate: Deferred<(), String> = Deferred::new();

    let resource = SharedAsyncResource::<String, String>::new("library", {
        let calls = calls.clone();
        let gate = gate.clone();
        move |_updater| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                gate.wait().await?;
                Ok("handle".to_string())
            }
        }
    });

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let mut tasks = Vec::new();
    for index in 0..32 {
        let resource = resource.clone();
        let delivered = delivered.clone();
        tasks.push(tokio::spawn(async move {
            resource.subscribe(move |value: &String| delivered.lock().push((index, value.clone())))
        }));
    }

    let mut subscriptions = Vec::new();
    for task in tasks {
        subscriptions.push(task.await.unwrap());
    }
    assert!(resource.read().is_none());

    gate.resolve(());
    assert_eq!(resource.resolve().await, Ok("handle".to_string()));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let delivered = delivered.lock();
    assert_eq!(delivered.len(), 32);
    assert!(delivered.iter().all(|(_, value)| value == "handle"));
}

#[tokio::test]
async fn test_subscribe_after_resolution_needs_no_tick() {
    let resource =
        SharedAsyncResource::<u32, String>::new("ready", |_updater| async { Ok(11) });
    assert_eq!(resource.resolve().await, Ok(11));

    let seen = Arc::new(Mutex::new(None));
    let _sub = resource.subscribe({
        let seen = seen.clone();
        move |value: &u32| *seen.lock() = Some(*value)
    });

    assert_eq!(*seen.lock(), Some(11));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_replay_is_not_overtaken_by_concurrent_push() {
    let updater_slot: Arc<Mutex<Option<Updater<u32>>>> = Arc::new(Mutex::new(None));
    let resource = SharedAsyncResource::<u32, String>::new("pushed", {
        let updater_slot = updater_slot.clone();
        move |updater| {
            *updater_slot.lock() = Some(updater);
            async { Ok(0) }
        }
    });
    assert_eq!(resource.resolve().await, Ok(0));
    let updater = updater_slot.lock().clone().unwrap();

    for round in 1..=500u32 {
        let pusher = std::thread::spawn({
            let updater = updater.clone();
            move || updater.push(round)
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscription = resource.subscribe({
            let seen = seen.clone();
            move |value: &u32| seen.lock().push(*value)
        });
        assert!(pusher.join().unwrap());

        let last = seen.lock().last().copied();
        assert_eq!(last, resource.read(), "round {} saw {:?}", round, seen.lock());
        assert_eq!(last, Some(round));
        subscription.unsubscribe();
    }
}
