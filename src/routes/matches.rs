use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, post, put},
};

use crate::{
    dto::matches::{MatchSnapshot, MatchTypeRequest, SubmitResultRequest},
    error::AppError,
    routes::admin::require_admin_mode,
    services::{match_service, result_service},
    state::SharedState,
};

/// Match endpoints; every transition requires admin mode.
pub fn router(state: SharedState) -> Router<SharedState> {
    let gated = Router::new()
        .route("/match/start", post(start_match))
        .route("/match/end", post(end_match))
        .route("/match/result", post(submit_result))
        .route("/match/close", post(close_match))
        .route("/match/type", put(set_match_type))
        .route_layer(middleware::from_fn_with_state(state, require_admin_mode));

    Router::new().route("/match", get(get_match)).merge(gated)
}

/// Current match.
#[utoipa::path(
    get,
    path = "/match",
    tag = "match",
    responses((status = 200, description = "Current match", body = MatchSnapshot))
)]
pub async fn get_match(State(state): State<SharedState>) -> Json<MatchSnapshot> {
    Json(match_service::snapshot(&state).await)
}

/// Start the stopwatch.
#[utoipa::path(
    post,
    path = "/match/start",
    tag = "match",
    responses(
        (status = 200, description = "Match started", body = MatchSnapshot),
        (status = 403, description = "Admin mode is disabled"),
        (status = 409, description = "A match is already in progress")
    )
)]
pub async fn start_match(State(state): State<SharedState>) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::start_match(&state).await?))
}

/// End the match and open result entry. Ignored with fewer than two players queued.
#[utoipa::path(
    post,
    path = "/match/end",
    tag = "match",
    responses(
        (status = 200, description = "Match ended, or still running when fewer than two players wait", body = MatchSnapshot),
        (status = 403, description = "Admin mode is disabled"),
        (status = 409, description = "No match is running")
    )
)]
pub async fn end_match(State(state): State<SharedState>) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::end_match(&state).await?))
}

/// Submit the final score and close the match.
#[utoipa::path(
    post,
    path = "/match/result",
    tag = "match",
    request_body = SubmitResultRequest,
    responses(
        (status = 200, description = "Result submitted and match closed", body = MatchSnapshot),
        (status = 400, description = "Tie not allowed"),
        (status = 403, description = "Admin mode is disabled"),
        (status = 409, description = "No match result is being entered"),
        (status = 503, description = "Contestants could not be removed; result entry stays open")
    )
)]
pub async fn submit_result(
    State(state): State<SharedState>,
    Json(payload): Json<SubmitResultRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(
        result_service::submit_result(&state, payload.score_a, payload.score_b).await?,
    ))
}

/// Close result entry without submitting a result.
#[utoipa::path(
    post,
    path = "/match/close",
    tag = "match",
    responses(
        (status = 200, description = "Match closed", body = MatchSnapshot),
        (status = 403, description = "Admin mode is disabled"),
        (status = 409, description = "No match result is being entered"),
        (status = 503, description = "Contestants could not be removed; result entry stays open")
    )
)]
pub async fn close_match(State(state): State<SharedState>) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::close_match(&state, None).await?))
}

/// Select the mode recorded with the next result.
#[utoipa::path(
    put,
    path = "/match/type",
    tag = "match",
    request_body = MatchTypeRequest,
    responses(
        (status = 200, description = "Match type updated", body = MatchSnapshot),
        (status = 403, description = "Admin mode is disabled")
    )
)]
pub async fn set_match_type(
    State(state): State<SharedState>,
    Json(payload): Json<MatchTypeRequest>,
) -> Json<MatchSnapshot> {
    Json(match_service::set_match_type(&state, payload.match_type).await)
}
