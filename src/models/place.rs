use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The canonical enrichment output for a venue referenced by name in an
/// itinerary. A record with `place_id == None` is a best-effort fallback
/// (name + generic image) and is never persisted.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolvedPlace {
    pub place_id: Option<String>,
    pub display_name: String,
    pub rating: Option<f64>,
    pub rating_count: u32,
    pub map_link: Option<String>,
    pub website_link: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub category_tags: Vec<String>,
    pub image_url: Option<String>,
    pub image_reference: Option<String>,
    /// All name variants seen for this place (query name, resolved name,
    /// formatted address), pipe-joined. Drives fuzzy re-lookup.
    pub search_keywords: String,
}

impl ResolvedPlace {
    /// Name-only record used when every lookup tier missed.
    pub fn fallback(display_name: &str, image_url: Option<String>) -> Self {
        Self {
            place_id: None,
            display_name: display_name.to_string(),
            rating: None,
            rating_count: 0,
            map_link: None,
            website_link: None,
            coordinates: None,
            category_tags: Vec::new(),
            image_url,
            image_reference: None,
            search_keywords: display_name.to_string(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.category_tags.iter().any(|t| t == tag)
    }
}

/// Persistent form of a resolved place, keyed by `place_id`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CachedPlace {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub place_id: String,
    pub display_name: String,
    pub rating: Option<f64>,
    pub rating_count: u32,
    pub map_link: Option<String>,
    pub website_link: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub category_tags: Vec<String>,
    pub image_url: Option<String>,
    pub image_reference: Option<String>,
    pub search_keywords: String,
    /// Lowercased tokens of `search_keywords`, indexed for fuzzy lookup.
    pub keyword_tokens: Vec<String>,
    pub cached_at: DateTime,
    pub updated_at: DateTime,
}

impl CachedPlace {
    /// Builds the persistent form. Returns `None` for fallback records,
    /// which must not be cached.
    pub fn from_place(place: &ResolvedPlace) -> Option<Self> {
        let place_id = place.place_id.clone()?;
        let now = DateTime::now();
        Some(Self {
            id: None,
            place_id,
            display_name: place.display_name.clone(),
            rating: place.rating,
            rating_count: place.rating_count,
            map_link: place.map_link.clone(),
            website_link: place.website_link.clone(),
            coordinates: place.coordinates.clone(),
            category_tags: place.category_tags.clone(),
            image_url: place.image_url.clone(),
            image_reference: place.image_reference.clone(),
            search_keywords: place.search_keywords.clone(),
            keyword_tokens: tokenize_keywords(&place.search_keywords),
            cached_at: now,
            updated_at: now,
        })
    }

    pub fn into_place(self) -> ResolvedPlace {
        ResolvedPlace {
            place_id: Some(self.place_id),
            display_name: self.display_name,
            rating: self.rating,
            rating_count: self.rating_count,
            map_link: self.map_link,
            website_link: self.website_link,
            coordinates: self.coordinates,
            category_tags: self.category_tags,
            image_url: self.image_url,
            image_reference: self.image_reference,
            search_keywords: self.search_keywords,
        }
    }
}

/// Lowercased, deduplicated tokens used as the fuzzy-lookup index over
/// `search_keywords`. Splits on the pipe separator and whitespace.
pub fn tokenize_keywords(keywords: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in keywords
        .split(|c: char| c == '|' || c.is_whitespace() || c == ',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
    {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}
