use futures::future::BoxFuture;
use futures::{FutureExt, TryStreamExt};
use mongodb::bson::doc;
use mongodb::bson::DateTime;
use mongodb::{Client, Collection};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::models::place::{tokenize_keywords, CachedPlace};

#[derive(Debug)]
pub enum PlaceStoreError {
    Database(String),
}

impl fmt::Display for PlaceStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceStoreError::Database(msg) => write!(f, "Place store error: {}", msg),
        }
    }
}

impl Error for PlaceStoreError {}

impl From<mongodb::error::Error> for PlaceStoreError {
    fn from(err: mongodb::error::Error) -> Self {
        PlaceStoreError::Database(err.to_string())
    }
}

/// Persistent place cache. Upserts are idempotent on `place_id`, so races
/// between concurrent enrichments of the same place converge.
pub trait PlaceStore: Send + Sync {
    /// Exact display-name match, falling back to keyword-token containment.
    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<CachedPlace>, PlaceStoreError>>;

    fn upsert<'a>(&'a self, place: &'a CachedPlace)
        -> BoxFuture<'a, Result<(), PlaceStoreError>>;

    /// Patches only the image fields of an existing entry (healing path).
    fn update_image<'a>(
        &'a self,
        place_id: &'a str,
        image_url: &'a str,
        image_reference: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), PlaceStoreError>>;

    /// Full scan for the image health sweep.
    fn scan_all<'a>(&'a self) -> BoxFuture<'a, Result<Vec<CachedPlace>, PlaceStoreError>>;
}

pub struct MongoPlaceStore {
    client: Arc<Client>,
}

impl MongoPlaceStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn collection(&self) -> Collection<CachedPlace> {
        self.client.database("Itineraries").collection("PlaceCache")
    }

    async fn find_impl(&self, name: &str) -> Result<Option<CachedPlace>, PlaceStoreError> {
        let collection = self.collection();

        // Exact name first: cheap and unambiguous.
        if let Some(hit) = collection.find_one(doc! { "display_name": name }).await? {
            return Ok(Some(hit));
        }

        // Fuzzy: every token of the query must appear in the entry's
        // keyword-token index. Same containment semantics as a substring
        // match against search_keywords, without a collection regex scan.
        let tokens = tokenize_keywords(name);
        if tokens.is_empty() {
            return Ok(None);
        }
        let hit = collection
            .find_one(doc! { "keyword_tokens": { "$all": tokens } })
            .await?;
        Ok(hit)
    }

    async fn upsert_impl(&self, place: &CachedPlace) -> Result<(), PlaceStoreError> {
        let collection = self.collection();
        let mut stored = place.clone();
        stored.id = None;
        stored.updated_at = DateTime::now();

        collection
            .replace_one(doc! { "place_id": &place.place_id }, stored)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn update_image_impl(
        &self,
        place_id: &str,
        image_url: &str,
        image_reference: Option<&str>,
    ) -> Result<(), PlaceStoreError> {
        let collection = self.collection();
        let update = doc! {
            "$set": {
                "image_url": image_url,
                "image_reference": image_reference,
                "updated_at": DateTime::now(),
            }
        };
        collection
            .update_one(doc! { "place_id": place_id }, update)
            .await?;
        Ok(())
    }

    async fn scan_all_impl(&self) -> Result<Vec<CachedPlace>, PlaceStoreError> {
        let cursor = self.collection().find(doc! {}).await?;
        let entries: Vec<CachedPlace> = cursor.try_collect().await?;
        Ok(entries)
    }
}

impl PlaceStore for MongoPlaceStore {
    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<CachedPlace>, PlaceStoreError>> {
        self.find_impl(name).boxed()
    }

    fn upsert<'a>(
        &'a self,
        place: &'a CachedPlace,
    ) -> BoxFuture<'a, Result<(), PlaceStoreError>> {
        self.upsert_impl(place).boxed()
    }

    fn update_image<'a>(
        &'a self,
        place_id: &'a str,
        image_url: &'a str,
        image_reference: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), PlaceStoreError>> {
        self.update_image_impl(place_id, image_url, image_reference)
            .boxed()
    }

    fn scan_all<'a>(&'a self) -> BoxFuture<'a, Result<Vec<CachedPlace>, PlaceStoreError>> {
        self.scan_all_impl().boxed()
    }
}
