pub mod activation;
mod dto;
pub mod handlers;
pub mod hub;
mod layout;
pub mod model;
mod repo;
mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
