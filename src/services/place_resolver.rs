use futures::FutureExt;
use std::sync::Arc;

use crate::models::place::{CachedPlace, ResolvedPlace};
use crate::services::heuristics::Heuristics;
use crate::services::image_search_service::{
    fallback_image, fallback_kind_for_tags, image_hint_for_tags, ImageResolver,
};
use crate::services::place_cache_service::PlaceStore;
use crate::services::place_search_service::PlaceSearch;
use crate::services::resolution_cache::ResolutionCache;

const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Which tier served a resolution. Only `Search` made an external
/// place-search call; callers pace their request rate on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolutionSource {
    /// Structural placeholder or empty name, no lookup at all.
    Placeholder,
    /// Attached to a resolution already held in the in-process cache.
    InProcessCache,
    /// Served from the persistent place cache.
    Store,
    /// External text search, whether it hit or fell back.
    Search,
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Language hint passed to the place search.
    pub language: String,
    /// In-process resolution cache bound (clear-on-full).
    pub cache_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Turns a free-text place name from a generated draft into a verified,
/// photo-bearing record. Lookup order: in-process cache, persistent cache
/// (with image healing), external place search. Always returns a record;
/// failures degrade to a name-only fallback that is never persisted.
#[derive(Clone)]
pub struct PlaceResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    search: Arc<dyn PlaceSearch>,
    images: Arc<ImageResolver>,
    store: Arc<dyn PlaceStore>,
    cache: ResolutionCache<(ResolvedPlace, ResolutionSource)>,
    heuristics: Heuristics,
    language: String,
}

impl PlaceResolver {
    pub fn new(
        search: Arc<dyn PlaceSearch>,
        images: Arc<ImageResolver>,
        store: Arc<dyn PlaceStore>,
        heuristics: Heuristics,
        config: ResolverConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                search,
                images,
                store,
                cache: ResolutionCache::new(config.cache_capacity),
                heuristics,
                language: config.language,
            }),
        }
    }

    pub async fn resolve(&self, raw_name: &str, city_context: &str) -> ResolvedPlace {
        self.resolve_traced(raw_name, city_context).await.0
    }

    /// As `resolve`, also reporting which tier served the record.
    pub async fn resolve_traced(
        &self,
        raw_name: &str,
        city_context: &str,
    ) -> (ResolvedPlace, ResolutionSource) {
        let name = raw_name.trim();
        if name.is_empty() {
            let place = ResolvedPlace::fallback(name, Some(fallback_image("default")));
            return (place, ResolutionSource::Placeholder);
        }

        // Structural placeholders (check-in, return-to-lodging) are not
        // venues; short-circuit before any cache or external call.
        if self.inner.heuristics.is_structural_marker(name) {
            let mut place = ResolvedPlace::fallback(name, Some(fallback_image("hotel")));
            place.category_tags = vec!["lodging".to_string()];
            return (place, ResolutionSource::Placeholder);
        }

        let inner = self.inner.clone();
        let owned_name = name.to_string();
        let city = city_context.trim().to_string();
        let (resolution, fresh) = self.inner.cache.get_or_insert_with(name, move || {
            async move { resolve_uncached(inner, owned_name, city).await }.boxed()
        });

        let (place, source) = resolution.await;

        // A miss is delivered but not kept: the next request should retry
        // the external lookup rather than replay the fallback.
        if place.place_id.is_none() {
            self.inner.cache.remove(name);
        }

        if fresh {
            (place, source)
        } else {
            (place, ResolutionSource::InProcessCache)
        }
    }
}

async fn resolve_uncached(
    inner: Arc<ResolverInner>,
    name: String,
    city: String,
) -> (ResolvedPlace, ResolutionSource) {
    // Persistent cache, exact or fuzzy.
    match inner.store.find_by_name(&name).await {
        Ok(Some(cached)) => {
            return (heal_if_needed(inner, cached).await, ResolutionSource::Store)
        }
        Ok(None) => {}
        Err(e) => eprintln!("Place cache read failed for '{}': {}", name, e),
    }

    // External search. Context first: geocoders weight leading terms more
    // heavily, so "{city} {name}" beats "{name} {city}" on precision.
    let query = if city.is_empty() {
        name.clone()
    } else {
        format!("{} {}", city, name)
    };

    let candidates = match inner.search.text_search(&query, &inner.language).await {
        Ok(candidates) => candidates,
        Err(e) => {
            eprintln!("Place search failed for '{}': {}", query, e);
            Vec::new()
        }
    };

    let Some(candidate) = candidates.into_iter().next() else {
        println!("No place found for '{}', returning name-only fallback", query);
        let place = ResolvedPlace::fallback(&name, Some(fallback_image("default")));
        return (place, ResolutionSource::Search);
    };

    let display_name = if candidate.display_name.trim().is_empty() {
        name.clone()
    } else {
        candidate.display_name.clone()
    };

    let image_query = match image_hint_for_tags(&candidate.category_tags) {
        Some(hint) => format!("{} {}", display_name, hint),
        None => display_name.clone(),
    };
    let image = inner.images.resolve(&image_query).await;

    let search_keywords = assemble_keywords(&[
        &name,
        &display_name,
        candidate.formatted_address.as_deref().unwrap_or(""),
    ]);

    let mut place = ResolvedPlace {
        place_id: Some(candidate.place_id),
        display_name,
        rating: candidate.rating,
        rating_count: candidate.rating_count,
        map_link: candidate.map_link,
        website_link: candidate.website_link,
        coordinates: candidate.coordinates,
        category_tags: candidate.category_tags,
        image_url: image.as_ref().map(|i| i.url.clone()),
        image_reference: image.map(|i| i.query),
        search_keywords,
    };

    // Persist before substituting the generic image: a null image in the
    // store is the healing condition for later requests.
    if let Some(cached) = CachedPlace::from_place(&place) {
        if let Err(e) = inner.store.upsert(&cached).await {
            eprintln!(
                "Failed to cache place '{}': {} (result still returned)",
                place.display_name, e
            );
        }
    }

    if place.image_url.is_none() {
        place.image_url = Some(fallback_image(fallback_kind_for_tags(&place.category_tags)));
    }

    (place, ResolutionSource::Search)
}

/// Persistent hit. When the stored entry has no image, runs one image
/// resolution pass and patches the store in a detached task. The caller's
/// response is not blocked on the write, and a write failure only costs a
/// retry of the heal on some later request.
async fn heal_if_needed(inner: Arc<ResolverInner>, cached: CachedPlace) -> ResolvedPlace {
    let mut place = cached.into_place();
    if place.image_url.is_some() {
        return place;
    }

    if let Some(image) = inner.images.resolve(&place.display_name).await {
        place.image_url = Some(image.url.clone());
        place.image_reference = Some(image.query.clone());

        if let Some(place_id) = place.place_id.clone() {
            let store = inner.store.clone();
            tokio::spawn(async move {
                if let Err(e) = store
                    .update_image(&place_id, &image.url, Some(&image.query))
                    .await
                {
                    eprintln!("Failed to persist healed image for {}: {}", place_id, e);
                }
            });
        }
    }

    place
}

/// Pipe-joined, deduplicated name variants (query name, resolved name,
/// formatted address) used for fuzzy re-lookup.
fn assemble_keywords(variants: &[&str]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for variant in variants {
        let trimmed = variant.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !parts.iter().any(|p| p == trimmed) {
            parts.push(trimmed.to_string());
        }
    }
    parts.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_keywords_dedupes_variants() {
        let keywords = assemble_keywords(&["Seoul Tower", "N Seoul Tower", ""]);
        assert_eq!(keywords, "Seoul Tower|N Seoul Tower");

        let same = assemble_keywords(&["Louvre", "Louvre", "Rue de Rivoli, Paris"]);
        assert_eq!(same, "Louvre|Rue de Rivoli, Paris");
    }
}
