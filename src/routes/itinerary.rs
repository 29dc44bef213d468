use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;

use crate::models::itinerary::Itinerary;
use crate::AppState;

/*
    POST /api/itineraries/enrich

    Takes a draft itinerary (as produced by the generation step) and runs
    the full enrichment pass: dedup, category fixes, place resolution,
    booking links and route annotations.
*/
pub async fn enrich(data: web::Data<AppState>, body: web::Json<Itinerary>) -> impl Responder {
    let mut itinerary = body.into_inner();

    if itinerary.days.is_empty() {
        return HttpResponse::BadRequest().body("Itinerary has no days");
    }

    if NaiveDate::parse_from_str(&itinerary.start_date, "%Y-%m-%d").is_err()
        || NaiveDate::parse_from_str(&itinerary.end_date, "%Y-%m-%d").is_err()
    {
        return HttpResponse::BadRequest().body("Dates must be in YYYY-MM-DD format");
    }

    println!(
        "Enriching itinerary for '{}' ({} days)",
        itinerary.destination,
        itinerary.days.len()
    );

    // Enrichment never fails as a whole; bad entries degrade individually.
    data.post_processor.process(&mut itinerary).await;

    HttpResponse::Ok().json(itinerary)
}
