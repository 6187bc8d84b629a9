pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod model;
pub mod pg;
pub mod store;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::profile_routes()
}
