mod common;

use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::json;

use tripweaver_api::routes;
use tripweaver_api::services::heuristics::Heuristics;
use tripweaver_api::services::place_resolver::{PlaceResolver, ResolverConfig};
use tripweaver_api::services::post_processor::{
    ConcurrencyMode, ItineraryPostProcessor, PostProcessorConfig,
};
use tripweaver_api::services::route_annotator::{RouteAnnotator, TravelMode};
use tripweaver_api::AppState;

use common::{
    image_resolver, place_candidate, MemoryPlaceStore, MockDirections, MockImageSearch,
    MockPlaceSearch,
};

fn test_state() -> web::Data<AppState> {
    let search = Arc::new(
        MockPlaceSearch::new()
            .with_candidate("palace", place_candidate("p-2", "Gyeongbokgung Palace", &["tourist_attraction"]))
            .with_candidate("village", place_candidate("p-3", "Bukchon Hanok Village", &["tourist_attraction"])),
    );
    let images = Arc::new(MockImageSearch::answering_all("https://img.example/a.jpg"));
    let resolver = PlaceResolver::new(
        search,
        image_resolver(images),
        Arc::new(MemoryPlaceStore::new()),
        Heuristics::default(),
        ResolverConfig::default(),
    );
    let post_processor = ItineraryPostProcessor::new(
        resolver.clone(),
        RouteAnnotator::new(Arc::new(MockDirections::with_modes(vec![TravelMode::Transit]))),
        Heuristics::default(),
        PostProcessorConfig {
            concurrency_mode: ConcurrencyMode::SequentialWithDelay,
            inter_call_delay_ms: 1,
        },
    );
    web::Data::new(AppState {
        resolver,
        post_processor,
    })
}

#[actix_web::test]
async fn test_enrich_endpoint_returns_enriched_itinerary() {
    let app = test::init_service(
        App::new().app_data(test_state()).route(
            "/api/itineraries/enrich",
            web::post().to(routes::itinerary::enrich),
        ),
    )
    .await;

    let draft = json!({
        "destination": "Seoul",
        "start_date": "2026-09-01",
        "end_date": "2026-09-02",
        "days": [{
            "date": "2026-09-01",
            "activities": [
                {
                    "time": "10:00",
                    "place_name": "Gyeongbokgung Palace",
                    "category": "sightseeing"
                },
                {
                    "time": "14:00",
                    "place_name": "Bukchon Hanok Village",
                    "category": "sightseeing"
                }
            ]
        }]
    });

    let req = test::TestRequest::post()
        .uri("/api/itineraries/enrich")
        .set_json(&draft)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    let activities = &body["days"][0]["activities"];
    assert_eq!(activities[0]["place_id"], "p-2");
    assert_eq!(activities[0]["image_url"], "https://img.example/a.jpg");
    assert_eq!(activities[1]["place_id"], "p-3");
    assert_eq!(activities[1]["travel_info"]["mode"], "Public transit");
}

#[actix_web::test]
async fn test_enrich_rejects_empty_itineraries() {
    let app = test::init_service(
        App::new().app_data(test_state()).route(
            "/api/itineraries/enrich",
            web::post().to(routes::itinerary::enrich),
        ),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/enrich")
        .set_json(&json!({
            "destination": "Seoul",
            "start_date": "2026-09-01",
            "end_date": "2026-09-02",
            "days": []
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_place_resolve_endpoint() {
    let app = test::init_service(
        App::new()
            .app_data(test_state())
            .route("/api/places/resolve", web::get().to(routes::place::resolve)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/places/resolve?name=Gyeongbokgung%20Palace&city=Seoul")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["place_id"], "p-2");
    assert_eq!(body["display_name"], "Gyeongbokgung Palace");
}
