//! Promo code endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use common::Collection;
use document_store::{DocumentStore, InsertResult, UpdateResult, document};
use serde_json::{Map, Value};

use super::{AppState, list_all, parse_id};
use crate::error::ApiError;

/// Field stamped by the server when a promo code is created.
pub const CREATED_AT: &str = "createdAt";

/// POST /promocodes — store the promo code with a server-side `createdAt`.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<InsertResult>, ApiError> {
    let mut promo = document::from_json(body)?;
    promo.insert(CREATED_AT, bson::DateTime::from_chrono(Utc::now()));

    let result = state.store.insert_one(Collection::PromoCodes, promo).await?;
    Ok(Json(result))
}

/// GET /promocodes — every promo code.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    list_all(&state.store, Collection::PromoCodes).await
}

/// GET /promocode/{id} — one promo code, or `null` when none matches.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let promo = state.store.find_by_id(Collection::PromoCodes, id).await?;
    Ok(Json(promo.map(document::to_json).unwrap_or(Value::Null)))
}

/// PATCH /promocode/{id} — merge the body into the promo code.
///
/// An id with no matching promo code creates one.
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
        .upsert_fields(Collection::PromoCodes, id, fields)
        .await?;

    if result.was_upsert() {
        tracing::warn!(%id, "promo code update matched nothing, created new promo code");
    }
    Ok(Json(result))
}
