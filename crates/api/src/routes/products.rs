//! Product catalogue endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::Collection;
use document_store::{DocumentStore, InsertResult, document};
use serde_json::{Map, Value};

use super::{AppState, list_all};
use crate::error::ApiError;

/// POST /products — store the body as a new product.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<InsertResult>, ApiError> {
    let product = document::from_json(body)?;
    let result = state.store.insert_one(Collection::Products, product).await?;
    Ok(Json(result))
}

/// GET /products — every product.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    list_all(&state.store, Collection::Products).await
}
