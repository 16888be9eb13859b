//! Concurrency properties of the dispatch bridge and nonce generator.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use exchange_api_client::auth::{IncreasingNonce, NonceProvider};
use exchange_api_client::dispatch::Dispatcher;
use exchange_api_client::error::ExchangeError;

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_dispatches_share_one_nonce_generator() {
    let dispatcher = Dispatcher::new();
    let provider = Arc::new(IncreasingNonce::new());

    // Two dispatched operations race on the same client's generator, each
    // drawing 1000 nonces. The union must contain 2000 distinct values.
    let mut futures = Vec::new();
    for _ in 0..2 {
        let p = provider.clone();
        futures.push(dispatcher.dispatch(move || {
            let mut nonces = Vec::with_capacity(1000);
            for _ in 0..1000 {
                nonces.push(p.next_nonce());
            }
            Ok(nonces)
        }));
    }

    let mut all: Vec<u64> = Vec::new();
    for future in futures {
        let nonces = future.await.unwrap();
        // Strictly increasing in call order within each operation.
        for pair in nonces.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        all.extend(nonces);
    }

    let distinct: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(distinct.len(), 2000);

    // Merged by value, the set is strictly increasing by construction.
    let mut sorted = all.clone();
    sorted.sort_unstable();
    for pair in sorted.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dispatch_does_not_block_caller() {
    let dispatcher = Dispatcher::new();

    let started = Instant::now();
    let future = dispatcher.dispatch(|| {
        std::thread::sleep(Duration::from_millis(50));
        Ok(42u32)
    });
    assert!(
        started.elapsed() < Duration::from_millis(10),
        "dispatch must return before the work completes"
    );

    assert_eq!(future.await.unwrap(), 42);
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exactly_once_delivery_under_fanout() {
    let dispatcher = Dispatcher::new();
    let executed = Arc::new(AtomicU32::new(0));

    let futures: Vec<_> = (0..64)
        .map(|_| {
            let counter = executed.clone();
            dispatcher.dispatch(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
        .collect();

    for future in futures {
        future.await.unwrap();
    }
    assert_eq!(executed.load(Ordering::SeqCst), 64);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_errors_never_escape_dispatch_synchronously() {
    let dispatcher = Dispatcher::new();

    // Returning an error and panicking both arrive via the future.
    let failed: Result<(), _> = dispatcher
        .dispatch(|| Err(ExchangeError::InvalidResponse("bad body".to_string())))
        .await;
    assert!(matches!(failed, Err(ExchangeError::InvalidResponse(_))));

    let panicked: Result<(), _> = dispatcher.dispatch(|| panic!("worker bug")).await;
    assert!(matches!(panicked, Err(ExchangeError::DispatchInternal(_))));
}
