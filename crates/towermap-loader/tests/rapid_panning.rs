//! Loader behaviour against a populated on-disk store.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use time::macros::datetime;
use towermap_loader::{
    ChannelSink, DisplayEvent, DisplayEvents, IncrementalLoader, LoadOutcome, LoaderConfig,
};
use towermap_store::Store;
use towermap_types::{Boundaries, Cell, Fix, Measurement, Radio};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("towermap_loader=debug")
        .try_init();
}

/// A grid of `side * side` measurements over lat/lon [0, side/10).
fn grid(side: u32, area: i32) -> Vec<Measurement> {
    (0..side * side)
        .map(|i| {
            let lat = f64::from(i / side) * 0.1;
            let lon = f64::from(i % side) * 0.1;
            Measurement::new(
                Fix::new(lat, lon, datetime!(2024-05-01 12:00 UTC)).accuracy(3.0),
                vec![Cell::new(Radio::Lte, 260, 2, area, i64::from(i))],
            )
        })
        .collect()
}

fn open_store(dir: &TempDir, side: u32) -> Arc<Store> {
    let store = Store::open(dir.path().join("measurements.db")).unwrap();
    store.insert_measurements(&grid(side, 100)).unwrap();
    Arc::new(store)
}

fn drain(events: &mut DisplayEvents) -> Vec<DisplayEvent> {
    std::iter::from_fn(|| events.try_recv()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rapid_requests_converge_on_latest() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 100);
    let (sink, mut events) = ChannelSink::channel();
    let loader = IncrementalLoader::new(store, Arc::new(sink), LoaderConfig::default());

    let requests: Vec<Boundaries> = (0..40)
        .map(|i| {
            let south = f64::from(i % 50) * 0.1;
            Boundaries::new(south, 0.0, south + 2.0, 5.0).unwrap()
        })
        .collect();

    for (i, b) in requests.iter().enumerate() {
        loader.request_load(*b);
        if i % 5 == 0 {
            tokio::task::yield_now().await;
        }
    }
    loader.wait_idle().await;

    let loaded: Vec<Boundaries> = drain(&mut events)
        .into_iter()
        .map(|event| match event {
            DisplayEvent::Loaded { boundaries, .. } => boundaries,
            other => panic!("unexpected event: {other:?}"),
        })
        .collect();

    assert!(!loaded.is_empty());
    assert_eq!(loaded.last(), requests.last());

    // Published sets follow request order.
    let positions: Vec<usize> = loaded
        .iter()
        .map(|b| requests.iter().position(|r| r == b).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_mid_load_is_consistent() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 150);
    let (sink, mut events) = ChannelSink::channel();
    let loader = IncrementalLoader::new(store, Arc::new(sink), LoaderConfig::default());

    loader.request_load(Boundaries::WORLD);
    tokio::time::sleep(Duration::from_millis(2)).await;
    loader.cancel();
    loader.wait_idle().await;

    let published = drain(&mut events);
    match loader.last_outcome() {
        Some(LoadOutcome::Cancelled) => assert!(published.is_empty()),
        Some(LoadOutcome::Completed { rows }) => {
            assert_eq!(rows, 150 * 150);
            assert_eq!(published.len(), 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_after_concurrent_writes_sees_every_row() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 10);
    let (sink, mut events) = ChannelSink::channel();
    let loader = IncrementalLoader::new(Arc::clone(&store), Arc::new(sink), LoaderConfig::default());

    let writer = {
        let store = Arc::clone(&store);
        tokio::task::spawn_blocking(move || {
            for m in grid(20, 200) {
                store.insert_measurement(&m).unwrap();
            }
        })
    };

    for _ in 0..10 {
        loader.request_load(Boundaries::WORLD);
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    writer.await.unwrap();

    loader.request_load(Boundaries::WORLD);
    loader.wait_idle().await;

    match drain(&mut events).pop() {
        Some(DisplayEvent::Loaded { measurements, .. }) => assert_eq!(measurements.len(), 500),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(store.count_measurements().unwrap(), 500);
}
