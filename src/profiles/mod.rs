mod dto;
pub mod editor;
mod errors;
pub mod handlers;
pub mod loader;
#[cfg(test)]
pub(crate) mod memory;
pub mod notify;
pub mod repo;
pub mod repo_types;
pub mod rest;
mod services;
pub mod sessions;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
