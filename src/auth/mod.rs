use axum::{middleware, Router};

use crate::{rate_limit, state::AppState};

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router(state: AppState) -> Router<AppState> {
    handlers::auth_routes().layer(middleware::from_fn_with_state(
        state,
        rate_limit::auth_limit,
    ))
}
