use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod extractors;
pub mod gate;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod session;
pub mod validation;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
