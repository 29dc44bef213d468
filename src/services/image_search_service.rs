use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One image-search candidate.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    pub url: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug)]
pub enum ImageSearchError {
    EnvironmentError(String),
    HttpError(reqwest::Error),
    ResponseError(String),
}

impl fmt::Display for ImageSearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSearchError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            ImageSearchError::HttpError(err) => write!(f, "HTTP error: {}", err),
            ImageSearchError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl Error for ImageSearchError {}

impl From<reqwest::Error> for ImageSearchError {
    fn from(err: reqwest::Error) -> Self {
        ImageSearchError::HttpError(err)
    }
}

/// Image-search capability. Filtering and retries live in `ImageResolver`.
pub trait ImageSearch: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ImageCandidate>, ImageSearchError>>;
}

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    link: String,
    image: Option<CustomSearchImage>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchImage {
    #[serde(rename = "thumbnailLink")]
    thumbnail_link: Option<String>,
}

#[derive(Clone)]
pub struct GoogleImageSearch {
    client: Client,
    api_key: String,
    engine_id: String,
}

impl GoogleImageSearch {
    pub fn new() -> Result<Self, ImageSearchError> {
        let api_key = env::var("GOOGLE_SEARCH_API_KEY").map_err(|_| {
            ImageSearchError::EnvironmentError("GOOGLE_SEARCH_API_KEY not set".to_string())
        })?;
        let engine_id = env::var("GOOGLE_SEARCH_ENGINE_ID").map_err(|_| {
            ImageSearchError::EnvironmentError("GOOGLE_SEARCH_ENGINE_ID not set".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key,
            engine_id,
        })
    }

    async fn execute(&self, query: &str) -> Result<Vec<ImageCandidate>, ImageSearchError> {
        let response = self
            .client
            .get("https://www.googleapis.com/customsearch/v1")
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("searchType", "image"),
                ("num", "8"),
                ("q", query),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageSearchError::ResponseError(format!(
                "Image search failed with status {}: {}",
                status, error_text
            )));
        }

        let search_response: CustomSearchResponse = response.json().await.map_err(|e| {
            ImageSearchError::ResponseError(format!("Failed to parse image search response: {}", e))
        })?;

        Ok(search_response
            .items
            .into_iter()
            .map(|item| ImageCandidate {
                thumbnail_url: item.image.and_then(|i| i.thumbnail_link),
                url: item.link,
            })
            .collect())
    }
}

impl ImageSearch for GoogleImageSearch {
    fn search<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ImageCandidate>, ImageSearchError>> {
        self.execute(query).boxed()
    }
}

/// URL filtering rules applied to raw image-search candidates.
#[derive(Debug, Clone)]
pub struct ImageFilterConfig {
    /// URL substrings that mark a candidate as irrelevant or broken when
    /// embedded (profile shots, ads, album covers).
    pub denied_patterns: Vec<String>,
    /// Domains that hotlink-protect their images and fail to render embedded.
    pub blocked_domains: Vec<String>,
    /// Domains known to embed cleanly; preferred when present.
    pub preferred_domains: Vec<String>,
}

impl Default for ImageFilterConfig {
    fn default() -> Self {
        Self {
            denied_patterns: vec![
                "profile".to_string(),
                "avatar".to_string(),
                "/ads/".to_string(),
                "advert".to_string(),
                "album".to_string(),
                "music".to_string(),
                "spotify".to_string(),
                "soundcloud".to_string(),
            ],
            blocked_domains: vec![
                "instagram.com".to_string(),
                "fbcdn.net".to_string(),
                "facebook.com".to_string(),
                "tiktokcdn".to_string(),
                "pinimg.com".to_string(),
            ],
            preferred_domains: vec![
                "wikimedia.org".to_string(),
                "wikipedia.org".to_string(),
                "googleusercontent.com".to_string(),
                "gstatic.com".to_string(),
                "unsplash.com".to_string(),
            ],
        }
    }
}

impl ImageFilterConfig {
    fn is_denied(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        self.denied_patterns.iter().any(|p| lowered.contains(p.as_str()))
            || self.blocked_domains.iter().any(|d| lowered.contains(d.as_str()))
    }

    fn is_preferred(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        self.preferred_domains.iter().any(|d| lowered.contains(d.as_str()))
    }

    /// Picks the best candidate: preferred-domain survivor first, then any
    /// non-denied URL, then a thumbnail if every full URL is denylisted,
    /// and finally the first raw result.
    pub fn pick(&self, candidates: &[ImageCandidate]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        let allowed: Vec<&ImageCandidate> = candidates
            .iter()
            .filter(|c| !self.is_denied(&c.url))
            .collect();

        if let Some(c) = allowed.iter().find(|c| self.is_preferred(&c.url)) {
            return Some(c.url.clone());
        }
        if let Some(c) = allowed.first() {
            return Some(c.url.clone());
        }

        candidates
            .iter()
            .find_map(|c| c.thumbnail_url.clone())
            .or_else(|| candidates.first().map(|c| c.url.clone()))
    }
}

/// Image found by the sub-pipeline, together with the query that produced
/// it. The query is stored as the image reference so the image can be
/// re-derived later.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub url: String,
    pub query: String,
}

// Generic travel-context suffixes appended on the last retry tier, in order.
const TRAVEL_CONTEXT_KEYWORDS: &[&str] = &["travel photo", "landmark", "scenery", "hotel"];

/// Tiered image lookup. LLM-produced venue names are often brand compounds
/// or imprecise, so a single raw query has a high miss rate; each tier
/// relaxes the query and is attempted at most once.
pub struct ImageResolver {
    search: Arc<dyn ImageSearch>,
    filters: ImageFilterConfig,
    brand_suffix: Regex,
}

impl ImageResolver {
    pub fn new(search: Arc<dyn ImageSearch>, filters: ImageFilterConfig) -> Self {
        let brand_suffix =
            Regex::new(r"(?i)\s+by\s+\S.*$").expect("brand suffix pattern must compile");
        Self {
            search,
            filters,
            brand_suffix,
        }
    }

    /// Strips a trailing `by <brand>` from hotel/franchise compound names.
    /// Returns `None` when the query has no such suffix.
    fn strip_brand_suffix(&self, query: &str) -> Option<String> {
        let simplified = self.brand_suffix.replace(query, "").trim().to_string();
        if simplified.is_empty() || simplified == query.trim() {
            None
        } else {
            Some(simplified)
        }
    }

    async fn search_filtered(&self, query: &str) -> Option<String> {
        match self.search.search(query).await {
            Ok(candidates) => self.filters.pick(&candidates),
            Err(e) => {
                eprintln!("Image search failed for '{}': {}", query, e);
                None
            }
        }
    }

    /// Runs the tier chain for `query`. Returns `None` when every tier
    /// misses; the caller substitutes a category-keyed generic image.
    pub async fn resolve(&self, query: &str) -> Option<ResolvedImage> {
        if let Some(url) = self.search_filtered(query).await {
            return Some(ResolvedImage {
                url,
                query: query.to_string(),
            });
        }

        if let Some(simplified) = self.strip_brand_suffix(query) {
            if let Some(url) = self.search_filtered(&simplified).await {
                return Some(ResolvedImage {
                    url,
                    query: simplified,
                });
            }
            let hinted = format!("{} hotel", simplified);
            if let Some(url) = self.search_filtered(&hinted).await {
                return Some(ResolvedImage { url, query: hinted });
            }
        }

        for keyword in TRAVEL_CONTEXT_KEYWORDS {
            let relaxed = format!("{} {}", query, keyword);
            if let Some(url) = self.search_filtered(&relaxed).await {
                return Some(ResolvedImage {
                    url,
                    query: relaxed,
                });
            }
        }

        None
    }
}

// Category-keyed generic stock images used when every tier misses.
const FALLBACK_IMAGES: &[(&str, &str)] = &[
    ("food", "https://images.unsplash.com/photo-1504674900247-0877df9cc836?w=800"),
    ("nature", "https://images.unsplash.com/photo-1441974231531-c6227db76b6e?w=800"),
    ("culture", "https://images.unsplash.com/photo-1518998053901-5348d3961a04?w=800"),
    ("hotel", "https://images.unsplash.com/photo-1566073771259-6a8506099945?w=800"),
    ("city", "https://images.unsplash.com/photo-1449824913935-59a10b8d2000?w=800"),
    ("default", "https://images.unsplash.com/photo-1469854523086-cc02fe5d8800?w=800"),
];

pub fn fallback_image(kind: &str) -> String {
    FALLBACK_IMAGES
        .iter()
        .find(|(k, _)| *k == kind)
        .or_else(|| FALLBACK_IMAGES.iter().find(|(k, _)| *k == "default"))
        .map(|(_, url)| url.to_string())
        .unwrap_or_default()
}

/// Maps place category tags onto a fallback-image key.
pub fn fallback_kind_for_tags(tags: &[String]) -> &'static str {
    let has = |needle: &str| tags.iter().any(|t| t.contains(needle));
    if has("restaurant") || has("food") || has("cafe") || has("bakery") {
        "food"
    } else if has("park") || has("natural_feature") || has("campground") {
        "nature"
    } else if has("museum") || has("temple") || has("church") || has("art_gallery") {
        "culture"
    } else if has("lodging") || has("hotel") {
        "hotel"
    } else if has("locality") || has("neighborhood") {
        "city"
    } else {
        "default"
    }
}

/// Category tag → image-query suffix used when searching for a freshly
/// resolved place ("<name> restaurant" beats "<name>" for chains).
pub fn image_hint_for_tags(tags: &[String]) -> Option<&'static str> {
    let has = |needle: &str| tags.iter().any(|t| t.contains(needle));
    if has("lodging") || has("hotel") {
        Some("hotel")
    } else if has("restaurant") || has("cafe") {
        Some("restaurant")
    } else if has("park") || has("natural_feature") {
        Some("park")
    } else if has("museum") || has("art_gallery") {
        Some("museum")
    } else {
        None
    }
}
