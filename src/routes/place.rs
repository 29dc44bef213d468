use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub name: String,
    #[serde(default)]
    pub city: String,
}

/*
    GET /api/places/resolve?name=...&city=...

    Direct access to the place resolver, used by the itinerary modify pass
    which rebuilds activities one at a time.
*/
pub async fn resolve(data: web::Data<AppState>, query: web::Query<ResolveQuery>) -> impl Responder {
    if query.name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Missing place name");
    }

    let place = data.resolver.resolve(&query.name, &query.city).await;
    HttpResponse::Ok().json(place)
}
