use crate::state::AppState;
use axum::Router;

mod copy;
mod dto;
pub mod guard;
pub mod handlers;
pub mod repo;
mod sync;

pub fn router() -> Router<AppState> {
    handlers::recipe_routes()
}
