use serde::{Deserialize, Serialize};

use crate::models::place::{Coordinates, ResolvedPlace};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Sightseeing,
    Meal,
    Lodging,
    #[serde(other)]
    Other,
}

/// Travel annotation for the hop from the previous activity in the day.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TravelInfo {
    pub duration_text: String,
    pub distance_text: String,
    pub mode: String,
}

/// One itinerary entry. Created as a bare shape by the draft-generation
/// step, then mutated in place by the post-processor to merge in resolved
/// place fields and travel info.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Activity {
    pub time: String,
    pub place_name: String,
    pub category: ActivityCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_booking_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_info: Option<TravelInfo>,

    // Enrichment fields, populated from the place resolver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Activity {
    /// Merges resolver output onto the activity, overwriting the display
    /// name with the canonical one when resolution actually found the place.
    pub fn merge_place(&mut self, place: &ResolvedPlace) {
        if place.place_id.is_some() && !place.display_name.trim().is_empty() {
            self.place_name = place.display_name.clone();
        }
        self.place_id = place.place_id.clone();
        self.rating = place.rating;
        self.rating_count = Some(place.rating_count);
        self.map_link = place.map_link.clone();
        self.website_link = place.website_link.clone();
        self.coordinates = place.coordinates.clone();
        self.category_tags = place.category_tags.clone();
        self.image_url = place.image_url.clone();
    }
}

/// Ordered activities for one calendar date. Ordering is chronological and
/// drives route annotation between consecutive entries.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DayPlan {
    pub date: String,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Itinerary {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DayPlan>,
}
