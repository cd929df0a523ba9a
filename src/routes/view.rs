use axum::{
    Json, Router,
    extract::State,
    response::Redirect,
    routing::get,
};

use crate::{dto::view::ViewResponse, services::view_service, state::SharedState};

/// Page configuration routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/view", get(get_view))
        .route("/stats", get(stats))
}

/// Venue name, image, notice and admin flag for the front-desk page.
#[utoipa::path(
    get,
    path = "/view",
    tag = "view",
    responses((status = 200, description = "Page configuration", body = ViewResponse))
)]
pub async fn get_view(State(state): State<SharedState>) -> Json<ViewResponse> {
    Json(view_service::view(&state).await)
}

/// Send the browser to the external registration and statistics page.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "view",
    responses((status = 307, description = "Redirect to the statistics page"))
)]
pub async fn stats(State(state): State<SharedState>) -> Redirect {
    Redirect::temporary(&view_service::stats_url(&state))
}
