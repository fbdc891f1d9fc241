use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::state::AppState;

use super::dto::{CategoryView, ProductView, SearchParams};
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/:id", get(get_product))
        .route("/categories", get(list_categories))
        .route("/categories/:id/products", get(category_products))
}

#[instrument(skip(state))]
async fn list_products(State(state): State<AppState>) -> Json<Vec<ProductView>> {
    Json(services::list_products(&state).await)
}

#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, (StatusCode, String)> {
    match services::get_product(&state, id).await {
        Some(product) => Ok(Json(product)),
        None => Err((StatusCode::NOT_FOUND, "Product not found".into())),
    }
}

#[instrument(skip(state))]
async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<ProductView>> {
    Json(services::search_products(&state, &params.q).await)
}

#[instrument(skip(state))]
async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategoryView>> {
    Json(services::list_categories(&state).await)
}

#[instrument(skip(state))]
async fn category_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<ProductView>> {
    Json(services::products_by_category(&state, id).await)
}
