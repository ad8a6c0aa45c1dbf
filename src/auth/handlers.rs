use axum::{extract::State, response::Redirect, routing::post, Router};
use tracing::{info, instrument};

use crate::{auth::extractors::AuthUser, state::AppState};

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/auth/signout", post(sign_out))
}

/// Ends the caller's profile session and navigates away.
#[instrument(skip(state))]
pub async fn sign_out(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Redirect {
    let had_session = state.sessions.unmount(user_id);
    info!(
        %user_id,
        had_session,
        live_sessions = state.sessions.live_count(),
        "signed out"
    );
    Redirect::to(&state.config.signout_redirect)
}
