use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::services::image_search_service::ImageResolver;
use crate::services::place_cache_service::PlaceStore;

const DEFAULT_SWEEP_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_PACING_MS: u64 = 200;

/// Lightweight existence probe for an image URL.
pub trait UrlProbe: Send + Sync {
    fn is_reachable<'a>(&'a self, url: &'a str) -> BoxFuture<'a, bool>;
}

pub struct HttpUrlProbe {
    client: Client,
}

impl HttpUrlProbe {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpUrlProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlProbe for HttpUrlProbe {
    fn is_reachable<'a>(&'a self, url: &'a str) -> BoxFuture<'a, bool> {
        async move {
            match self.client.head(url).send().await {
                Ok(response) => response.status().is_success(),
                Err(_) => false,
            }
        }
        .boxed()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepStats {
    pub checked: usize,
    pub repaired: usize,
    pub skipped: usize,
}

/// Background job that re-validates cached image URLs and repairs broken
/// ones through the image sub-pipeline. Entries it cannot repair are left
/// as-is: a broken image is better than losing the rating/location data on
/// the record.
pub struct ImageHealthSweep {
    store: Arc<dyn PlaceStore>,
    images: Arc<ImageResolver>,
    probe: Arc<dyn UrlProbe>,
    period: Duration,
    pacing: Duration,
}

impl ImageHealthSweep {
    pub fn new(
        store: Arc<dyn PlaceStore>,
        images: Arc<ImageResolver>,
        probe: Arc<dyn UrlProbe>,
    ) -> Self {
        let period_secs = std::env::var("IMAGE_SWEEP_PERIOD_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SWEEP_PERIOD_SECS);
        Self {
            store,
            images,
            probe,
            period: Duration::from_secs(period_secs),
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
        }
    }

    pub fn with_timing(mut self, period: Duration, pacing: Duration) -> Self {
        self.period = period;
        self.pacing = pacing;
        self
    }

    /// Runs forever on the configured period. Each pass runs to completion
    /// before the next sleep starts, so passes never overlap.
    pub async fn run(self) {
        loop {
            sleep(self.period).await;
            let stats = self.run_once().await;
            println!(
                "Image health sweep finished: {} checked, {} repaired, {} left as-is",
                stats.checked, stats.repaired, stats.skipped
            );
        }
    }

    /// One full pass over the persistent cache. Sequential with a pacing
    /// delay between items to stay under third-party rate limits.
    pub async fn run_once(&self) -> SweepStats {
        let mut stats = SweepStats::default();

        let entries = match self.store.scan_all().await {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("Image health sweep could not scan the place cache: {}", e);
                return stats;
            }
        };

        for entry in entries {
            let Some(current_url) = entry.image_url.as_deref() else {
                continue;
            };

            stats.checked += 1;

            if self.probe.is_reachable(current_url).await {
                sleep(self.pacing).await;
                continue;
            }

            // A replacement is only written once verified reachable; an
            // unverified swap would just trade one broken link for another.
            match self.images.resolve(&entry.display_name).await {
                Some(image) if self.probe.is_reachable(&image.url).await => {
                    match self
                        .store
                        .update_image(&entry.place_id, &image.url, Some(&image.query))
                        .await
                    {
                        Ok(()) => {
                            println!(
                                "Repaired image for '{}' ({})",
                                entry.display_name, entry.place_id
                            );
                            stats.repaired += 1;
                        }
                        Err(e) => {
                            eprintln!(
                                "Failed to store repaired image for '{}': {}",
                                entry.display_name, e
                            );
                            stats.skipped += 1;
                        }
                    }
                }
                _ => {
                    eprintln!(
                        "No reachable replacement image for '{}', leaving entry unchanged",
                        entry.display_name
                    );
                    stats.skipped += 1;
                }
            }

            sleep(self.pacing).await;
        }

        stats
    }
}
