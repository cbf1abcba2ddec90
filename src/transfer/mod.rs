use axum::Router;

use crate::state::AppState;

pub mod csv;
pub mod handlers;
pub mod pdf;
pub mod repo;
pub mod service;

pub fn router() -> Router<AppState> {
    handlers::transfer_routes()
}
