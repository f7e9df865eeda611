//! Route handlers, one module per collection.
//!
//! Handlers talk to the document store directly; each maps one request to
//! one store call (order placement makes two).

pub mod cart;
pub mod orders;
pub mod products;
pub mod promocodes;
pub mod system;

use axum::Json;
use common::{Collection, DocumentId};
use document_store::{DocumentStore, document};
use serde_json::Value;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub store: S,
}

impl<S: DocumentStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

/// Parses a path parameter into a document id, rejecting malformed input.
pub(crate) fn parse_id(id: &str) -> Result<DocumentId, ApiError> {
    Ok(id.parse::<DocumentId>()?)
}

/// Returns every document in `collection` rendered as JSON.
pub(crate) async fn list_all<S: DocumentStore>(
    store: &S,
    collection: Collection,
) -> Result<Json<Vec<Value>>, ApiError> {
    let documents = store.find_all(collection).await?;
    Ok(Json(documents.into_iter().map(document::to_json).collect()))
}
