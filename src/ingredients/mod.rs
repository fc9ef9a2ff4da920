use crate::state::AppState;
use axum::Router;

pub mod category;
mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::ingredient_routes()
}
