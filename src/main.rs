use std::env;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use tripweaver_api::db;
use tripweaver_api::routes;
use tripweaver_api::services::heuristics::Heuristics;
use tripweaver_api::services::image_health_sweep::{HttpUrlProbe, ImageHealthSweep};
use tripweaver_api::services::image_search_service::{
    GoogleImageSearch, ImageFilterConfig, ImageResolver,
};
use tripweaver_api::services::place_cache_service::MongoPlaceStore;
use tripweaver_api::services::place_resolver::{PlaceResolver, ResolverConfig};
use tripweaver_api::services::place_search_service::GooglePlaceSearch;
use tripweaver_api::services::post_processor::{ItineraryPostProcessor, PostProcessorConfig};
use tripweaver_api::services::route_annotator::{GoogleDirections, RouteAnnotator};
use tripweaver_api::AppState;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let host = env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);

    let mongo_uri = env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;

    let place_search =
        Arc::new(GooglePlaceSearch::new().expect("Place search requires GOOGLE_PLACES_API_KEY"));
    let image_search = Arc::new(
        GoogleImageSearch::new()
            .expect("Image search requires GOOGLE_SEARCH_API_KEY and GOOGLE_SEARCH_ENGINE_ID"),
    );
    let directions =
        Arc::new(GoogleDirections::new().expect("Directions require GOOGLE_MAPS_API_KEY"));

    let images = Arc::new(ImageResolver::new(
        image_search,
        ImageFilterConfig::default(),
    ));
    let store = Arc::new(MongoPlaceStore::new(client.clone()));

    let resolver_config = ResolverConfig {
        language: env::var("PLACE_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
        ..ResolverConfig::default()
    };
    let resolver = PlaceResolver::new(
        place_search,
        images.clone(),
        store.clone(),
        Heuristics::default(),
        resolver_config,
    );

    let post_processor = ItineraryPostProcessor::new(
        resolver.clone(),
        RouteAnnotator::new(directions),
        Heuristics::default(),
        PostProcessorConfig::from_env(),
    );

    // Weekly repair pass over cached image links; never blocks requests.
    let sweep = ImageHealthSweep::new(store, images, Arc::new(HttpUrlProbe::new()));
    tokio::spawn(sweep.run());
    println!("Image health sweep scheduled");

    let state = web::Data::new(AppState {
        resolver,
        post_processor,
    });

    println!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(state.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .service(
                web::scope("/api")
                    .route(
                        "/itineraries/enrich",
                        web::post().to(routes::itinerary::enrich),
                    )
                    .route("/places/resolve", web::get().to(routes::place::resolve)),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
