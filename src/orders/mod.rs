pub mod dto;
pub mod error;
mod handlers;
pub mod services;
pub mod store;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
