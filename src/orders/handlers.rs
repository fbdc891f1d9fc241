use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::state::AppState;

use super::dto::{CreateOrderRequest, PlaceOrderResponse, StockResponse};
use super::services;
use super::store::PgOrderStore;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/products/:id/stock", get(product_stock))
}

/// Always answers 200 with the tagged result; the flow converts its own
/// failures instead of raising.
#[instrument(skip(state, body))]
async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Json<PlaceOrderResponse> {
    let store = PgOrderStore::new(state.db.clone());
    let outcome = services::place_order(
        &store,
        state.views.as_ref(),
        state.config.failure_mode,
        body,
    )
    .await;
    Json(outcome.into())
}

#[instrument(skip(state))]
async fn product_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<StockResponse> {
    let store = PgOrderStore::new(state.db.clone());
    match services::get_product_stock(&store, id).await {
        Ok(snapshot) => Json(StockResponse {
            success: true,
            stock: Some(snapshot.stock),
            name: Some(snapshot.name),
            error: None,
        }),
        Err(error) => Json(StockResponse {
            success: false,
            stock: None,
            name: None,
            error: Some(error),
        }),
    }
}
