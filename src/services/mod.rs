pub mod heuristics;
pub mod image_health_sweep;
pub mod image_search_service;
pub mod place_cache_service;
pub mod place_resolver;
pub mod place_search_service;
pub mod post_processor;
pub mod resolution_cache;
pub mod route_annotator;
