pub mod db;
pub mod models;
pub mod routes;
pub mod services;

use services::place_resolver::PlaceResolver;
use services::post_processor::ItineraryPostProcessor;

/// Shared handler state: the resolver for single-place lookups and the
/// post-processor for whole-itinerary enrichment.
pub struct AppState {
    pub resolver: PlaceResolver,
    pub post_processor: ItineraryPostProcessor,
}
