use futures::future::join_all;
use std::collections::HashSet;
use std::env;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

use crate::models::itinerary::{Activity, ActivityCategory, Itinerary};
use crate::services::heuristics::Heuristics;
use crate::services::place_resolver::{PlaceResolver, ResolutionSource};
use crate::services::route_annotator::RouteAnnotator;

const DEFAULT_INTER_CALL_DELAY_MS: u64 = 150;

/// How activities within a day are enriched. Sequential-with-delay is the
/// safer default against per-key provider rate limits; parallel fan-out is
/// available when the API budget allows bursts (the in-process resolution
/// cache still collapses duplicate names to one call).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConcurrencyMode {
    Parallel,
    SequentialWithDelay,
}

#[derive(Debug, Clone)]
pub struct PostProcessorConfig {
    pub concurrency_mode: ConcurrencyMode,
    pub inter_call_delay_ms: u64,
}

impl Default for PostProcessorConfig {
    fn default() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::SequentialWithDelay,
            inter_call_delay_ms: DEFAULT_INTER_CALL_DELAY_MS,
        }
    }
}

impl PostProcessorConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(mode) = env::var("ENRICH_CONCURRENCY") {
            if mode.eq_ignore_ascii_case("parallel") {
                config.concurrency_mode = ConcurrencyMode::Parallel;
            }
        }
        config
    }
}

/// Consumes a draft itinerary and produces the enriched, deduplicated,
/// type-corrected version with inter-stop travel annotations. Mutates the
/// itinerary in place; never fails, bad entries are skipped instead.
#[derive(Clone)]
pub struct ItineraryPostProcessor {
    resolver: PlaceResolver,
    annotator: RouteAnnotator,
    heuristics: Heuristics,
    config: PostProcessorConfig,
}

impl ItineraryPostProcessor {
    pub fn new(
        resolver: PlaceResolver,
        annotator: RouteAnnotator,
        heuristics: Heuristics,
        config: PostProcessorConfig,
    ) -> Self {
        Self {
            resolver,
            annotator,
            heuristics,
            config,
        }
    }

    pub async fn process(&self, itinerary: &mut Itinerary) {
        let destination = itinerary.destination.clone();

        // One seen-set across the whole trip: the same venue is never
        // scheduled twice, whichever day the generator repeated it on.
        let mut seen: HashSet<String> = HashSet::new();

        for day in &mut itinerary.days {
            let drafted = std::mem::take(&mut day.activities);

            // Dedup and category correction. Structural placeholders and
            // entries with no name (malformed draft data) bypass both.
            let mut kept: Vec<(Activity, Option<String>)> = Vec::new();
            for mut activity in drafted {
                let name = activity.place_name.trim().to_string();
                if name.is_empty() || self.heuristics.is_structural_marker(&name) {
                    kept.push((activity, None));
                    continue;
                }
                let key = name.to_lowercase();
                if !seen.insert(key.clone()) {
                    continue;
                }
                fix_category(&self.heuristics, &mut activity);
                kept.push((activity, Some(key)));
            }

            self.resolve_day(&mut kept, &destination).await;

            // Canonical names from the resolver can collide where raw names
            // did not ("Starbucks Myeongdong" and "Starbucks" resolving to
            // the same store), so dedup once more on the resolved names.
            let mut activities: Vec<Activity> = Vec::with_capacity(kept.len());
            for (activity, key) in kept {
                if let Some(original_key) = key {
                    let canonical = activity.place_name.trim().to_lowercase();
                    if canonical != original_key && !seen.insert(canonical) {
                        continue;
                    }
                }
                activities.push(activity);
            }

            for activity in &mut activities {
                apply_booking_url(activity, &destination);
            }

            self.annotate_routes(&mut activities).await;

            day.activities = activities;
        }
    }

    /// Resolves every deduped, non-structural activity of one day and
    /// merges the result in place.
    async fn resolve_day(&self, kept: &mut [(Activity, Option<String>)], destination: &str) {
        match self.config.concurrency_mode {
            ConcurrencyMode::SequentialWithDelay => {
                let delay = Duration::from_millis(self.config.inter_call_delay_ms);
                let last = kept.iter().rposition(|(_, key)| key.is_some());
                for (index, (activity, key)) in kept.iter_mut().enumerate() {
                    if key.is_none() {
                        continue;
                    }
                    let (place, source) = self
                        .resolver
                        .resolve_traced(&activity.place_name, destination)
                        .await;
                    activity.merge_place(&place);
                    // The delay paces successive external calls. Cache hits
                    // and the day's final lookup need none.
                    if source == ResolutionSource::Search && Some(index) != last {
                        sleep(delay).await;
                    }
                }
            }
            ConcurrencyMode::Parallel => {
                let lookups: Vec<_> = kept
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, key))| key.is_some())
                    .map(|(index, (activity, _))| {
                        let resolver = self.resolver.clone();
                        let name = activity.place_name.clone();
                        let destination = destination.to_string();
                        async move { (index, resolver.resolve(&name, &destination).await) }
                    })
                    .collect();

                for (index, place) in join_all(lookups).await {
                    kept[index].0.merge_place(&place);
                }
            }
        }
    }

    /// Attaches travel info to each activity whose predecessor and self
    /// both resolved to a real place. Pairs missing an identifier are
    /// skipped without a directions call; no meaningful route exists.
    async fn annotate_routes(&self, activities: &mut [Activity]) {
        for index in 1..activities.len() {
            let origin_id = match activities[index - 1].place_id.clone() {
                Some(id) => id,
                None => continue,
            };
            let dest_id = match activities[index].place_id.clone() {
                Some(id) => id,
                None => continue,
            };
            if let Some(info) = self.annotator.annotate(&origin_id, &dest_id).await {
                activities[index].travel_info = Some(info);
            }
        }
    }
}

/// Generators occasionally file "treat yourself" stops (nail shops, spas)
/// under "meal". Recategorize and scrub the food language so the entry
/// reads correctly.
pub(crate) fn fix_category(heuristics: &Heuristics, activity: &mut Activity) {
    if activity.category != ActivityCategory::Meal {
        return;
    }
    let haystack = format!("{} {}", activity.place_name, activity.description);
    if heuristics.looks_like_beauty_service(&haystack) {
        activity.category = ActivityCategory::Sightseeing;
        activity.description = heuristics.strip_meal_language(&activity.description);
    }
}

/// Booking URL priority: official website, then map link, then a
/// constructed web search. Parks and natural features never get one:
/// they are not reservable, and a search link there is noise.
pub(crate) fn apply_booking_url(activity: &mut Activity, destination: &str) {
    let is_nature = activity
        .category_tags
        .iter()
        .any(|t| t == "park" || t == "natural_feature");
    if is_nature {
        activity.booking_url = None;
        return;
    }
    if !activity.is_booking_required {
        return;
    }
    activity.booking_url = activity
        .website_link
        .clone()
        .or_else(|| activity.map_link.clone())
        .or_else(|| search_booking_url(destination, &activity.place_name));
}

fn search_booking_url(destination: &str, name: &str) -> Option<String> {
    let query = format!("{} {} booking", destination, name);
    Url::parse_with_params("https://www.google.com/search", &[("q", query.as_str())])
        .ok()
        .map(|url| url.to_string())
}
