use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    routing::get,
};

use crate::{
    dto::view::{AdminModeRequest, AdminModeResponse},
    error::AppError,
    services::view_service,
    state::SharedState,
};

/// Admin mode toggle. The toggle itself is never gated.
pub fn router() -> Router<SharedState> {
    Router::new().route("/admin/mode", get(get_mode).put(set_mode))
}

/// Report whether mutating operations are currently allowed.
#[utoipa::path(
    get,
    path = "/admin/mode",
    tag = "admin",
    responses((status = 200, description = "Current admin mode", body = AdminModeResponse))
)]
pub async fn get_mode(State(state): State<SharedState>) -> Json<AdminModeResponse> {
    Json(view_service::admin_mode(&state))
}

/// Switch admin mode on or off.
#[utoipa::path(
    put,
    path = "/admin/mode",
    tag = "admin",
    request_body = AdminModeRequest,
    responses((status = 200, description = "Admin mode updated", body = AdminModeResponse))
)]
pub async fn set_mode(
    State(state): State<SharedState>,
    Json(payload): Json<AdminModeRequest>,
) -> Json<AdminModeResponse> {
    Json(view_service::set_admin_mode(&state, payload.enabled))
}

/// Reject mutating requests while admin mode is off.
pub(crate) async fn require_admin_mode(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.is_admin() {
        return Err(AppError::Forbidden("admin mode is disabled".into()));
    }

    Ok(next.run(req).await)
}
