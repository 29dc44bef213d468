#![allow(dead_code)]

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tripweaver_api::models::itinerary::{Activity, ActivityCategory};
use tripweaver_api::models::place::{tokenize_keywords, CachedPlace, Coordinates};
use tripweaver_api::services::image_health_sweep::UrlProbe;
use tripweaver_api::services::image_search_service::{
    ImageCandidate, ImageFilterConfig, ImageResolver, ImageSearch, ImageSearchError,
};
use tripweaver_api::services::place_cache_service::{PlaceStore, PlaceStoreError};
use tripweaver_api::services::place_search_service::{
    PlaceCandidate, PlaceSearch, PlaceSearchError,
};
use tripweaver_api::services::route_annotator::{
    Directions, DirectionsError, RouteLeg, TravelMode,
};

/// Place search stub: answers with a candidate whenever the query contains
/// the registered needle (lowercased). Counts every call.
pub struct MockPlaceSearch {
    candidates: Vec<(String, PlaceCandidate)>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockPlaceSearch {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_candidate(mut self, needle: &str, candidate: PlaceCandidate) -> Self {
        self.candidates.push((needle.to_lowercase(), candidate));
        self
    }

    /// Simulated network latency, long enough for concurrent callers to
    /// pile onto one in-flight resolution.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PlaceSearch for MockPlaceSearch {
    fn text_search<'a>(
        &'a self,
        query: &'a str,
        _language: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PlaceCandidate>, PlaceSearchError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let lowered = query.to_lowercase();
            Ok(self
                .candidates
                .iter()
                .filter(|(needle, _)| lowered.contains(needle.as_str()))
                .map(|(_, candidate)| candidate.clone())
                .collect())
        }
        .boxed()
    }
}

/// Image search stub: optionally gated on a query needle, records every
/// query it was asked.
pub struct MockImageSearch {
    needle: Option<String>,
    url: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl MockImageSearch {
    /// Returns `url` for any query.
    pub fn answering_all(url: &str) -> Self {
        Self {
            needle: None,
            url: Some(url.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Returns `url` only when the query contains `needle`; empty results
    /// otherwise.
    pub fn answering_only(needle: &str, url: &str) -> Self {
        Self {
            needle: Some(needle.to_lowercase()),
            url: Some(url.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Never finds anything.
    pub fn never() -> Self {
        Self {
            needle: None,
            url: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl ImageSearch for MockImageSearch {
    fn search<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ImageCandidate>, ImageSearchError>> {
        async move {
            self.queries.lock().unwrap().push(query.to_string());
            let Some(url) = &self.url else {
                return Ok(Vec::new());
            };
            let matches = match &self.needle {
                Some(needle) => query.to_lowercase().contains(needle.as_str()),
                None => true,
            };
            if matches {
                Ok(vec![ImageCandidate {
                    url: url.clone(),
                    thumbnail_url: None,
                }])
            } else {
                Ok(Vec::new())
            }
        }
        .boxed()
    }
}

/// In-memory stand-in for the Mongo place cache, keyed by place id with
/// the same exact-or-token-containment read semantics.
#[derive(Default)]
pub struct MemoryPlaceStore {
    entries: Mutex<HashMap<String, CachedPlace>>,
}

impl MemoryPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, place: CachedPlace) {
        self.entries
            .lock()
            .unwrap()
            .insert(place.place_id.clone(), place);
    }

    pub fn get(&self, place_id: &str) -> Option<CachedPlace> {
        self.entries.lock().unwrap().get(place_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl PlaceStore for MemoryPlaceStore {
    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<CachedPlace>, PlaceStoreError>> {
        async move {
            let entries = self.entries.lock().unwrap();
            if let Some(exact) = entries.values().find(|p| p.display_name == name) {
                return Ok(Some(exact.clone()));
            }
            let tokens = tokenize_keywords(name);
            if tokens.is_empty() {
                return Ok(None);
            }
            let fuzzy = entries
                .values()
                .find(|p| tokens.iter().all(|t| p.keyword_tokens.contains(t)))
                .cloned();
            Ok(fuzzy)
        }
        .boxed()
    }

    fn upsert<'a>(
        &'a self,
        place: &'a CachedPlace,
    ) -> BoxFuture<'a, Result<(), PlaceStoreError>> {
        async move {
            self.entries
                .lock()
                .unwrap()
                .insert(place.place_id.clone(), place.clone());
            Ok(())
        }
        .boxed()
    }

    fn update_image<'a>(
        &'a self,
        place_id: &'a str,
        image_url: &'a str,
        image_reference: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), PlaceStoreError>> {
        async move {
            let mut entries = self.entries.lock().unwrap();
            if let Some(entry) = entries.get_mut(place_id) {
                entry.image_url = Some(image_url.to_string());
                entry.image_reference = image_reference.map(|r| r.to_string());
            }
            Ok(())
        }
        .boxed()
    }

    fn scan_all<'a>(&'a self) -> BoxFuture<'a, Result<Vec<CachedPlace>, PlaceStoreError>> {
        async move { Ok(self.entries.lock().unwrap().values().cloned().collect()) }.boxed()
    }
}

/// Directions stub with a configurable set of modes that yield a route.
pub struct MockDirections {
    available_modes: Vec<TravelMode>,
    calls: AtomicUsize,
}

impl MockDirections {
    pub fn with_modes(available_modes: Vec<TravelMode>) -> Self {
        Self {
            available_modes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Directions for MockDirections {
    fn route<'a>(
        &'a self,
        _origin_id: &'a str,
        _dest_id: &'a str,
        mode: TravelMode,
    ) -> BoxFuture<'a, Result<Option<RouteLeg>, DirectionsError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.available_modes.contains(&mode) {
                Ok(Some(RouteLeg {
                    duration_text: "12 mins".to_string(),
                    distance_text: "2.1 km".to_string(),
                }))
            } else {
                Ok(None)
            }
        }
        .boxed()
    }
}

/// Probe stub: a URL is reachable iff it was registered.
pub struct MockProbe {
    reachable: HashSet<String>,
}

impl MockProbe {
    pub fn reachable(urls: &[&str]) -> Self {
        Self {
            reachable: urls.iter().map(|u| u.to_string()).collect(),
        }
    }
}

impl UrlProbe for MockProbe {
    fn is_reachable<'a>(&'a self, url: &'a str) -> BoxFuture<'a, bool> {
        async move { self.reachable.contains(url) }.boxed()
    }
}

pub fn place_candidate(id: &str, name: &str, tags: &[&str]) -> PlaceCandidate {
    PlaceCandidate {
        place_id: id.to_string(),
        display_name: name.to_string(),
        rating: Some(4.5),
        rating_count: 321,
        map_link: Some(format!("https://maps.example/{}", id)),
        website_link: None,
        coordinates: Some(Coordinates {
            latitude: 37.5512,
            longitude: 126.9882,
        }),
        category_tags: tags.iter().map(|t| t.to_string()).collect(),
        formatted_address: Some("1 Example-ro, Example City".to_string()),
    }
}

pub fn cached_place(id: &str, name: &str, image_url: Option<&str>) -> CachedPlace {
    CachedPlace {
        id: None,
        place_id: id.to_string(),
        display_name: name.to_string(),
        rating: Some(4.2),
        rating_count: 87,
        map_link: Some(format!("https://maps.example/{}", id)),
        website_link: None,
        coordinates: None,
        category_tags: vec!["tourist_attraction".to_string()],
        image_url: image_url.map(|u| u.to_string()),
        image_reference: None,
        search_keywords: name.to_string(),
        keyword_tokens: tokenize_keywords(name),
        cached_at: mongodb::bson::DateTime::now(),
        updated_at: mongodb::bson::DateTime::now(),
    }
}

pub fn draft_activity(name: &str, category: ActivityCategory) -> Activity {
    Activity {
        time: "10:00".to_string(),
        place_name: name.to_string(),
        category,
        description: String::new(),
        is_booking_required: false,
        booking_url: None,
        travel_info: None,
        place_id: None,
        rating: None,
        rating_count: None,
        map_link: None,
        website_link: None,
        coordinates: None,
        category_tags: Vec::new(),
        image_url: None,
    }
}

pub fn image_resolver(search: Arc<dyn ImageSearch>) -> Arc<ImageResolver> {
    Arc::new(ImageResolver::new(search, ImageFilterConfig::default()))
}
