use crate::state::AppState;
use axum::Router;

pub(crate) mod claims;
pub(crate) mod extractors;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::session_routes()
}
