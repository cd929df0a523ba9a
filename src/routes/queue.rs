use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::{delete, get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::queue::{AddPlayerRequest, QueueView, RenamePlayerRequest},
    error::AppError,
    routes::admin::require_admin_mode,
    services::queue_service,
    state::SharedState,
};

/// Queue endpoints; mutations require admin mode.
pub fn router(state: SharedState) -> Router<SharedState> {
    let gated = Router::new()
        .route("/queue/players", post(add_player))
        .route("/queue/placeholder", post(add_placeholder))
        .route(
            "/queue/players/{id}",
            put(rename_player).delete(remove_player),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin_mode));

    Router::new()
        .route("/queue", get(get_queue))
        .route("/queue/refresh", post(refresh_queue))
        .route("/queue/alert", delete(dismiss_alert))
        .merge(gated)
}

/// Current waiting queue.
#[utoipa::path(
    get,
    path = "/queue",
    tag = "queue",
    responses((status = 200, description = "Waiting queue", body = QueueView))
)]
pub async fn get_queue(State(state): State<SharedState>) -> Json<QueueView> {
    Json(queue_service::snapshot(&state).await)
}

/// Pull the queue from the venue backend now.
#[utoipa::path(
    post,
    path = "/queue/refresh",
    tag = "queue",
    responses((status = 200, description = "Waiting queue after the refresh", body = QueueView))
)]
pub async fn refresh_queue(State(state): State<SharedState>) -> Json<QueueView> {
    Json(queue_service::refresh_and_snapshot(&state).await)
}

/// Acknowledge the alert shown to the admin.
#[utoipa::path(
    delete,
    path = "/queue/alert",
    tag = "queue",
    responses((status = 200, description = "Alert cleared", body = QueueView))
)]
pub async fn dismiss_alert(State(state): State<SharedState>) -> Json<QueueView> {
    Json(queue_service::dismiss_alert(&state).await)
}

/// Append a registered player to the queue. Blank names are ignored.
#[utoipa::path(
    post,
    path = "/queue/players",
    tag = "queue",
    request_body = AddPlayerRequest,
    responses(
        (status = 200, description = "Waiting queue after the add", body = QueueView),
        (status = 400, description = "Invalid player name"),
        (status = 403, description = "Admin mode is disabled")
    )
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AddPlayerRequest>>,
) -> Json<QueueView> {
    Json(queue_service::add_player(&state, &payload.name).await)
}

/// Append an empty slot to the queue.
#[utoipa::path(
    post,
    path = "/queue/placeholder",
    tag = "queue",
    responses(
        (status = 200, description = "Waiting queue after the add", body = QueueView),
        (status = 403, description = "Admin mode is disabled")
    )
)]
pub async fn add_placeholder(State(state): State<SharedState>) -> Json<QueueView> {
    Json(queue_service::add_placeholder(&state).await)
}

/// Rename a queued player.
#[utoipa::path(
    put,
    path = "/queue/players/{id}",
    tag = "queue",
    params(("id" = Uuid, Path, description = "Identifier of the queued player")),
    request_body = RenamePlayerRequest,
    responses(
        (status = 200, description = "Waiting queue after the rename", body = QueueView),
        (status = 403, description = "Admin mode is disabled"),
        (status = 404, description = "Player is not queued")
    )
)]
pub async fn rename_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<RenamePlayerRequest>>,
) -> Result<Json<QueueView>, AppError> {
    Ok(Json(
        queue_service::rename_player(&state, id, &payload.name).await?,
    ))
}

/// Remove a queued player.
#[utoipa::path(
    delete,
    path = "/queue/players/{id}",
    tag = "queue",
    params(("id" = Uuid, Path, description = "Identifier of the queued player")),
    responses(
        (status = 200, description = "Waiting queue after the removal", body = QueueView),
        (status = 403, description = "Admin mode is disabled"),
        (status = 404, description = "Player is not queued")
    )
)]
pub async fn remove_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QueueView>, AppError> {
    Ok(Json(queue_service::remove_player(&state, id).await?))
}
