pub mod dto;
pub mod generator;
pub mod handlers;
pub mod locks;
pub mod model;
pub mod nutrition;
pub mod regenerate;
pub mod reorder;
pub mod services;
pub mod sessions;
pub mod slots;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
