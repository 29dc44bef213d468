pub mod itinerary;
pub mod place;
