use crate::state::AppState;
use axum::Router;

pub mod certification;
pub mod domain;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod repo;
mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
