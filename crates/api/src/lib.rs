//! HTTP gateway over the storefront document collections.
//!
//! Exposes products, cart, orders and promo codes as JSON endpoints backed
//! by a [`DocumentStore`], with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use common::Collection;
use document_store::{DocumentStore, DocumentStoreError};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::system::banner))
        .route("/health", get(routes::system::health::<S>))
        .route(
            "/products",
            post(routes::products::create::<S>).get(routes::products::list::<S>),
        )
        .route(
            "/cart",
            post(routes::cart::add::<S>).get(routes::cart::list::<S>),
        )
        .route("/cart/{id}", delete(routes::cart::remove::<S>))
        .route(
            "/orders",
            post(routes::orders::place::<S>).get(routes::orders::list::<S>),
        )
        .route("/order/{id}", patch(routes::orders::update::<S>))
        .route(
            "/promocodes",
            post(routes::promocodes::create::<S>).get(routes::promocodes::list::<S>),
        )
        .route(
            "/promocode/{id}",
            get(routes::promocodes::get::<S>).patch(routes::promocodes::update::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wraps the store in shared application state.
pub fn create_state<S: DocumentStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}

/// Verifies connectivity and installs the cart uniqueness constraint.
///
/// If the cart already holds duplicate product names the constraint cannot
/// be installed; startup continues and only the pre-insert check applies.
pub async fn prepare_store<S: DocumentStore>(store: &S) -> Result<(), DocumentStoreError> {
    store.ping().await?;
    tracing::info!("document store reachable");

    match store
        .ensure_unique(Collection::Cart, routes::cart::CART_KEY)
        .await
    {
        Ok(()) => Ok(()),
        Err(DocumentStoreError::DuplicateKey { .. }) => {
            tracing::warn!(
                field = routes::cart::CART_KEY,
                "cart holds duplicate items, unique constraint not installed"
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}
