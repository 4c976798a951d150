pub mod handlers;
pub mod model;
mod repo;
mod repo_types;
pub mod source;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
