//! Order placement and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::Collection;
use document_store::{DeleteResult, DocumentStore, InsertResult, UpdateResult, document};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{AppState, list_all, parse_id};
use crate::error::ApiError;

/// Results of the two writes that make up an order placement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub insert_result: InsertResult,
    pub delete_result: DeleteResult,
}

/// POST /orders — store the order, then empty the whole cart.
///
/// The two writes are not atomic. If clearing the cart fails the order
/// stays stored and the cart keeps its items.
#[tracing::instrument(skip(state, body))]
pub async fn place<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<PlaceOrderResponse>, ApiError> {
    let order = document::from_json(body)?;
    let insert_result = state.store.insert_one(Collection::Orders, order).await?;

    let order_id = match &insert_result.inserted_id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    };

    let delete_result = state
        .store
        .delete_all(Collection::Cart)
        .await
        .map_err(|e| {
            tracing::error!(%order_id, error = %e, "order stored but cart was not cleared");
            ApiError::Internal(format!(
                "Order {order_id} was stored but the cart could not be cleared: {e}"
            ))
        })?;

    metrics::counter!("orders_placed_total").increment(1);
    metrics::counter!("cart_items_cleared_total").increment(delete_result.deleted_count);
    tracing::info!(%order_id, cleared = delete_result.deleted_count, "order placed");

    Ok(Json(PlaceOrderResponse {
        insert_result,
        delete_result,
    }))
}

/// GET /orders — every order.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    list_all(&state.store, Collection::Orders).await
}

/// PATCH /order/{id} — merge the body (typically `status`) into the order.
///
/// An id with no matching order creates one.
#[tracing::instrument(skip(state, body))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<UpdateResult>, ApiError> {
    let id = parse_id(&id)?;
    let fields = document::from_json(body)?;
    let result = state
        .store
        .upsert_fields(Collection::Orders, id, fields)
        .await?;

    if result.was_upsert() {
        tracing::warn!(%id, "order update matched nothing, created new order");
    }
    Ok(Json(result))
}
