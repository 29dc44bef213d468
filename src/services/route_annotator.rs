use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::models::itinerary::TravelInfo;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TravelMode {
    Transit,
    Driving,
    Walking,
}

impl TravelMode {
    fn as_str(&self) -> &str {
        match self {
            TravelMode::Transit => "transit",
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
        }
    }

    fn label(&self) -> &str {
        match self {
            TravelMode::Transit => "Public transit",
            TravelMode::Driving => "Car",
            TravelMode::Walking => "Walk",
        }
    }
}

// Mode priority for inter-stop hops.
const MODE_FALLBACK_ORDER: &[TravelMode] =
    &[TravelMode::Transit, TravelMode::Driving, TravelMode::Walking];

/// Human-readable leg of a computed route.
#[derive(Debug, Clone)]
pub struct RouteLeg {
    pub duration_text: String,
    pub distance_text: String,
}

#[derive(Debug)]
pub enum DirectionsError {
    EnvironmentError(String),
    HttpError(reqwest::Error),
    ResponseError(String),
}

impl fmt::Display for DirectionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionsError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            DirectionsError::HttpError(err) => write!(f, "HTTP error: {}", err),
            DirectionsError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl Error for DirectionsError {}

impl From<reqwest::Error> for DirectionsError {
    fn from(err: reqwest::Error) -> Self {
        DirectionsError::HttpError(err)
    }
}

/// Directions capability between two resolved place identifiers.
/// `Ok(None)` is a miss (no route for that mode), not an error.
pub trait Directions: Send + Sync {
    fn route<'a>(
        &'a self,
        origin_id: &'a str,
        dest_id: &'a str,
        mode: TravelMode,
    ) -> BoxFuture<'a, Result<Option<RouteLeg>, DirectionsError>>;
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    duration: Option<TextValue>,
    distance: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
}

#[derive(Clone)]
pub struct GoogleDirections {
    client: Client,
    api_key: String,
    language: String,
}

impl GoogleDirections {
    pub fn new() -> Result<Self, DirectionsError> {
        let api_key = env::var("GOOGLE_MAPS_API_KEY").map_err(|_| {
            DirectionsError::EnvironmentError("GOOGLE_MAPS_API_KEY not set".to_string())
        })?;
        let language = env::var("ROUTE_LANGUAGE").unwrap_or_else(|_| "en".to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key,
            language,
        })
    }

    async fn fetch(
        &self,
        origin_id: &str,
        dest_id: &str,
        mode: TravelMode,
    ) -> Result<Option<RouteLeg>, DirectionsError> {
        let url = format!(
            "https://maps.googleapis.com/maps/api/directions/json?origin=place_id:{}&destination=place_id:{}&mode={}&language={}&key={}",
            origin_id,
            dest_id,
            mode.as_str(),
            self.language,
            self.api_key
        );

        let response = self.client.get(&url).send().await?;
        let directions: DirectionsResponse = response.json().await.map_err(|e| {
            DirectionsError::ResponseError(format!("Failed to parse directions response: {}", e))
        })?;

        if directions.status == "ZERO_RESULTS" {
            return Ok(None);
        }
        if directions.status != "OK" {
            return Err(DirectionsError::ResponseError(format!(
                "Directions API error: {}",
                directions.status
            )));
        }

        let leg = directions
            .routes
            .into_iter()
            .next()
            .and_then(|r| r.legs.into_iter().next());

        Ok(leg.and_then(|l| match (l.duration, l.distance) {
            (Some(duration), Some(distance)) => Some(RouteLeg {
                duration_text: duration.text,
                distance_text: distance.text,
            }),
            _ => None,
        }))
    }
}

impl Directions for GoogleDirections {
    fn route<'a>(
        &'a self,
        origin_id: &'a str,
        dest_id: &'a str,
        mode: TravelMode,
    ) -> BoxFuture<'a, Result<Option<RouteLeg>, DirectionsError>> {
        self.fetch(origin_id, dest_id, mode).boxed()
    }
}

/// Computes the travel annotation between two resolved stops, trying modes
/// in priority order. No route across all modes is a non-event: the hop is
/// simply left unannotated.
#[derive(Clone)]
pub struct RouteAnnotator {
    directions: Arc<dyn Directions>,
}

impl RouteAnnotator {
    pub fn new(directions: Arc<dyn Directions>) -> Self {
        Self { directions }
    }

    pub async fn annotate(&self, origin_id: &str, dest_id: &str) -> Option<TravelInfo> {
        for mode in MODE_FALLBACK_ORDER {
            match self.directions.route(origin_id, dest_id, *mode).await {
                Ok(Some(leg)) => {
                    return Some(TravelInfo {
                        duration_text: leg.duration_text,
                        distance_text: leg.distance_text,
                        mode: mode.label().to_string(),
                    });
                }
                Ok(None) => continue,
                Err(e) => {
                    eprintln!(
                        "Directions lookup ({}) failed for {} -> {}: {}",
                        mode.as_str(),
                        origin_id,
                        dest_id,
                        e
                    );
                    continue;
                }
            }
        }
        None
    }
}
