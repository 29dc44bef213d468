mod common;

use std::sync::Arc;
use std::time::Duration;

use tripweaver_api::services::image_health_sweep::ImageHealthSweep;

use common::{cached_place, image_resolver, MemoryPlaceStore, MockImageSearch, MockProbe};

fn sweep(
    store: Arc<MemoryPlaceStore>,
    images: Arc<MockImageSearch>,
    probe: MockProbe,
) -> ImageHealthSweep {
    ImageHealthSweep::new(store, image_resolver(images), Arc::new(probe))
        .with_timing(Duration::from_secs(3600), Duration::from_millis(1))
}

#[tokio::test]
async fn broken_image_is_replaced_with_a_reachable_one() {
    let store = Arc::new(MemoryPlaceStore::new());
    store.seed(cached_place("p-1", "N Seoul Tower", Some("https://img.example/dead.jpg")));

    let images = Arc::new(MockImageSearch::answering_all("https://img.example/fresh.jpg"));
    let probe = MockProbe::reachable(&["https://img.example/fresh.jpg"]);

    let stats = sweep(store.clone(), images, probe).run_once().await;

    assert_eq!(stats.checked, 1);
    assert_eq!(stats.repaired, 1);
    let entry = store.get("p-1").unwrap();
    assert_eq!(entry.image_url.as_deref(), Some("https://img.example/fresh.jpg"));
}

#[tokio::test]
async fn healthy_images_are_left_alone() {
    let store = Arc::new(MemoryPlaceStore::new());
    store.seed(cached_place("p-1", "N Seoul Tower", Some("https://img.example/ok.jpg")));

    let images = Arc::new(MockImageSearch::answering_all("https://img.example/other.jpg"));
    let probe = MockProbe::reachable(&["https://img.example/ok.jpg"]);

    let stats = sweep(store.clone(), images.clone(), probe).run_once().await;

    assert_eq!(stats.checked, 1);
    assert_eq!(stats.repaired, 0);
    assert!(images.queries().is_empty(), "no repair lookup for a healthy URL");
    let entry = store.get("p-1").unwrap();
    assert_eq!(entry.image_url.as_deref(), Some("https://img.example/ok.jpg"));
}

#[tokio::test]
async fn unreachable_replacement_is_never_written() {
    let store = Arc::new(MemoryPlaceStore::new());
    store.seed(cached_place("p-1", "N Seoul Tower", Some("https://img.example/dead.jpg")));

    // The candidate replacement is itself unreachable.
    let images = Arc::new(MockImageSearch::answering_all("https://img.example/also-dead.jpg"));
    let probe = MockProbe::reachable(&[]);

    let stats = sweep(store.clone(), images, probe).run_once().await;

    assert_eq!(stats.repaired, 0);
    assert_eq!(stats.skipped, 1);
    let entry = store.get("p-1").unwrap();
    assert_eq!(entry.image_url.as_deref(), Some("https://img.example/dead.jpg"));
}

#[tokio::test]
async fn entries_without_images_are_not_probed() {
    let store = Arc::new(MemoryPlaceStore::new());
    store.seed(cached_place("p-1", "Bukchon Hanok Village", None));

    let images = Arc::new(MockImageSearch::answering_all("https://img.example/x.jpg"));
    let probe = MockProbe::reachable(&[]);

    let stats = sweep(store.clone(), images, probe).run_once().await;

    assert_eq!(stats.checked, 0);
    assert!(store.get("p-1").unwrap().image_url.is_none());
}
