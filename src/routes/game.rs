use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::session::{CatalogResponse, DropRequest, DropResponse, EmailRequest, SessionSnapshot},
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes driving the single game session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/catalog", get(catalog))
        .route("/session", get(session))
        .route("/session/email", post(submit_email))
        .route("/session/drop", post(drop_item))
        .route("/session/reset", post(reset))
}

/// Items and buckets served to every session.
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "game",
    responses((status = 200, description = "Catalog", body = CatalogResponse))
)]
pub async fn catalog(State(state): State<SharedState>) -> Json<CatalogResponse> {
    Json(game_service::catalog(&state).await)
}

/// Current phase, countdown, placements and results.
#[utoipa::path(
    get,
    path = "/session",
    tag = "game",
    responses((status = 200, description = "Current session", body = SessionSnapshot))
)]
pub async fn session(State(state): State<SharedState>) -> Json<SessionSnapshot> {
    Json(game_service::session_snapshot(&state).await)
}

/// Submit the player's email and start the countdown.
#[utoipa::path(
    post,
    path = "/session/email",
    tag = "game",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Session started", body = SessionSnapshot),
        (status = 400, description = "Email missing or malformed"),
        (status = 409, description = "Not waiting for an email")
    )
)]
pub async fn submit_email(
    State(state): State<SharedState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    payload.validate()?;
    let snapshot = game_service::start_session(&state, &payload.email).await?;
    Ok(Json(snapshot))
}

/// Report an item released over a bucket.
#[utoipa::path(
    post,
    path = "/session/drop",
    tag = "game",
    request_body = DropRequest,
    responses(
        (status = 200, description = "Drop handled; `accepted` tells whether it was recorded", body = DropResponse),
        (status = 400, description = "Malformed drop"),
        (status = 409, description = "No game in progress")
    )
)]
pub async fn drop_item(
    State(state): State<SharedState>,
    Json(payload): Json<DropRequest>,
) -> Result<Json<DropResponse>, AppError> {
    payload.validate()?;
    let outcome = game_service::drop_item(&state, payload.into()).await?;
    Ok(Json(outcome.into()))
}

/// Play again from the results screen.
#[utoipa::path(
    post,
    path = "/session/reset",
    tag = "game",
    responses(
        (status = 200, description = "Back to email entry", body = SessionSnapshot),
        (status = 409, description = "Results are not showing")
    )
)]
pub async fn reset(State(state): State<SharedState>) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(game_service::reset_session(&state).await?))
}
