//! Shopping cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::Collection;
use document_store::{
    DeleteResult, DocumentStore, DocumentStoreError, DocumentStoreExt, InsertResult, document,
};
use serde_json::{Map, Value};

use super::{AppState, list_all, parse_id};
use crate::error::ApiError;

/// Field that identifies a cart line; at most one item per value.
pub const CART_KEY: &str = "productName";

/// Error message returned when the product is already in the cart.
pub const DUPLICATE_CART_ITEM: &str = "Product already exists in the cart";

fn duplicate_item() -> ApiError {
    metrics::counter!("cart_conflicts_total").increment(1);
    ApiError::Conflict(DUPLICATE_CART_ITEM.to_string())
}

/// POST /cart — add an item unless one with the same `productName` exists.
///
/// The lookup and the insert are separate round trips. When the store has
/// a unique constraint on `productName`, the loser of a race gets the same
/// conflict response; without one, both inserts can land.
#[tracing::instrument(skip(state, body))]
pub async fn add<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<InsertResult>, ApiError> {
    let key = document::json_to_bson(body.get(CART_KEY).cloned().unwrap_or(Value::Null))?;

    if state.store.exists_where(Collection::Cart, CART_KEY, key).await? {
        tracing::info!("rejected duplicate cart item");
        return Err(duplicate_item());
    }

    let item = document::from_json(body)?;
    match state.store.insert_one(Collection::Cart, item).await {
        Ok(result) => Ok(Json(result)),
        Err(DocumentStoreError::DuplicateKey { field, .. }) if field == CART_KEY => {
            tracing::info!("cart item lost insert race");
            Err(duplicate_item())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /cart — every cart item.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    list_all(&state.store, Collection::Cart).await
}

/// DELETE /cart/{id} — remove one item; a missing id deletes nothing.
#[tracing::instrument(skip(state))]
pub async fn remove<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let id = parse_id(&id)?;
    let result = state.store.delete_by_id(Collection::Cart, id).await?;
    Ok(Json(result))
}
