use axum::Router;

use crate::state::AppState;

pub mod blacklist;
pub mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod throttle;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
