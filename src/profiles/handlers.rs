use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{auth::extractors::AuthUser, state::AppState};

use super::dto::{EditProfileRequest, ProfileFormResponse, ProfileViewResponse, SubmitResponse};
use super::editor::SubmitOutcome;
use super::loader::{ProfileLoader, ProfileView};
use super::notify::Alert;
use super::services::LoadOutcome;

type Rejection = (StatusCode, Json<SubmitResponse>);

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profiles/:profile_id", get(get_profile))
        .route(
            "/me/profile",
            get(load_my_profile)
                .patch(edit_my_profile)
                .put(submit_my_profile),
        )
}

/// GET /profiles/:profile_id
/// Loader failures are silent: the card comes back with empty fields. That
/// includes ids that are not valid profile ids.
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(profile_id): Path<String>,
) -> Json<ProfileViewResponse> {
    let Ok(id) = profile_id.parse::<Uuid>() else {
        warn!(%viewer, %profile_id, "profile id is not a uuid");
        return Json(ProfileViewResponse::new(profile_id, &ProfileView::default()));
    };

    let loader = ProfileLoader::mount(state.store.clone(), id);
    let outcome = loader.load().await;
    debug!(%viewer, ?outcome, "profile card");
    Json(ProfileViewResponse::new(profile_id, &loader.view()))
}

/// GET /me/profile: mounts a fresh editor for the caller and loads it.
#[instrument(skip(state))]
pub async fn load_my_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileFormResponse>, Rejection> {
    let editor = state.sessions.mount(user_id);
    match editor.load().await {
        LoadOutcome::Loaded | LoadOutcome::Skipped => Ok(Json(ProfileFormResponse::from(&*editor))),
        LoadOutcome::Failed => Err(alert_rejection(Alert::LoadFailed)),
        LoadOutcome::Cancelled => Err(session_ended()),
    }
}

/// PATCH /me/profile: edits the form without writing. A fresh session is
/// loaded first.
#[instrument(skip(state))]
pub async fn edit_my_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(edit): Json<EditProfileRequest>,
) -> Json<ProfileFormResponse> {
    let editor = state.sessions.acquire(user_id).await;
    edit.apply_to(&editor);
    Json(ProfileFormResponse::from(&*editor))
}

/// PUT /me/profile: applies edits, then upserts the caller's row. A fresh
/// session is loaded first so omitted fields keep their stored values.
#[instrument(skip(state))]
pub async fn submit_my_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(edit): Json<EditProfileRequest>,
) -> Result<Json<SubmitResponse>, Rejection> {
    let editor = state.sessions.acquire(user_id).await;
    edit.apply_to(&editor);

    match editor.submit().await {
        SubmitOutcome::Saved => Ok(Json(SubmitResponse {
            message: Alert::ProfileUpdated.message().to_string(),
            profile: Some(ProfileFormResponse::from(&*editor)),
        })),
        SubmitOutcome::Failed => Err(alert_rejection(Alert::UpdateFailed)),
        SubmitOutcome::Ignored => Err((
            StatusCode::CONFLICT,
            Json(SubmitResponse::message("Profile is loading")),
        )),
        SubmitOutcome::Cancelled => Err(session_ended()),
    }
}

fn alert_rejection(alert: Alert) -> Rejection {
    (StatusCode::BAD_GATEWAY, Json(SubmitResponse::message(alert.message())))
}

fn session_ended() -> Rejection {
    (
        StatusCode::CONFLICT,
        Json(SubmitResponse::message("Profile session ended")),
    )
}
