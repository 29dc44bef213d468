use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::models::place::Coordinates;

/// One candidate from the text place search. The field mask deliberately
/// excludes photo data; images go through the cheaper image sub-pipeline.
#[derive(Debug, Clone)]
pub struct PlaceCandidate {
    pub place_id: String,
    pub display_name: String,
    pub rating: Option<f64>,
    pub rating_count: u32,
    pub map_link: Option<String>,
    pub website_link: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub category_tags: Vec<String>,
    pub formatted_address: Option<String>,
}

#[derive(Debug)]
pub enum PlaceSearchError {
    EnvironmentError(String),
    HttpError(reqwest::Error),
    ResponseError(String),
}

impl fmt::Display for PlaceSearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceSearchError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            PlaceSearchError::HttpError(err) => write!(f, "HTTP error: {}", err),
            PlaceSearchError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl Error for PlaceSearchError {}

impl From<reqwest::Error> for PlaceSearchError {
    fn from(err: reqwest::Error) -> Self {
        PlaceSearchError::HttpError(err)
    }
}

/// Text-search capability returning candidate place records. No caching
/// logic here; the resolver owns the lookup chain.
pub trait PlaceSearch: Send + Sync {
    fn text_search<'a>(
        &'a self,
        query: &'a str,
        language: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PlaceCandidate>, PlaceSearchError>>;
}

#[derive(Debug, Serialize)]
struct TextSearchRequest<'a> {
    #[serde(rename = "textQuery")]
    text_query: &'a str,
    #[serde(rename = "languageCode")]
    language_code: &'a str,
    #[serde(rename = "pageSize")]
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    places: Vec<GooglePlace>,
}

#[derive(Debug, Deserialize)]
struct GooglePlace {
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<LocalizedText>,
    rating: Option<f64>,
    #[serde(rename = "userRatingCount")]
    user_rating_count: Option<u32>,
    #[serde(rename = "googleMapsUri")]
    google_maps_uri: Option<String>,
    #[serde(rename = "websiteUri")]
    website_uri: Option<String>,
    location: Option<LatLng>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(rename = "formattedAddress")]
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

// Photo fields are intentionally absent from the mask: fetching them on the
// text-search call is the expensive path.
const PLACE_FIELD_MASK: &str = "places.id,places.displayName,places.rating,\
places.userRatingCount,places.googleMapsUri,places.websiteUri,places.location,\
places.types,places.formattedAddress";

#[derive(Clone)]
pub struct GooglePlaceSearch {
    client: Client,
    api_key: String,
}

impl GooglePlaceSearch {
    pub fn new() -> Result<Self, PlaceSearchError> {
        let api_key = env::var("GOOGLE_PLACES_API_KEY").map_err(|_| {
            PlaceSearchError::EnvironmentError("GOOGLE_PLACES_API_KEY not set".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, api_key })
    }

    async fn execute(
        &self,
        query: &str,
        language: &str,
    ) -> Result<Vec<PlaceCandidate>, PlaceSearchError> {
        let request = TextSearchRequest {
            text_query: query,
            language_code: language,
            page_size: 5,
        };

        let response = self
            .client
            .post("https://places.googleapis.com/v1/places:searchText")
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", PLACE_FIELD_MASK)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PlaceSearchError::ResponseError(format!(
                "Place search failed with status {}: {}",
                status, error_text
            )));
        }

        let search_response: TextSearchResponse = response.json().await.map_err(|e| {
            PlaceSearchError::ResponseError(format!("Failed to parse place search response: {}", e))
        })?;

        Ok(search_response
            .places
            .into_iter()
            .map(|p| PlaceCandidate {
                place_id: p.id,
                display_name: p.display_name.map(|n| n.text).unwrap_or_default(),
                rating: p.rating,
                rating_count: p.user_rating_count.unwrap_or(0),
                map_link: p.google_maps_uri,
                website_link: p.website_uri,
                coordinates: p.location.map(|l| Coordinates {
                    latitude: l.latitude,
                    longitude: l.longitude,
                }),
                category_tags: p.types,
                formatted_address: p.formatted_address,
            })
            .collect())
    }
}

impl PlaceSearch for GooglePlaceSearch {
    fn text_search<'a>(
        &'a self,
        query: &'a str,
        language: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PlaceCandidate>, PlaceSearchError>> {
        self.execute(query, language).boxed()
    }
}
