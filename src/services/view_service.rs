use tracing::info;

use crate::{
    dto::view::{AdminModeResponse, ViewResponse},
    services::sse_events::broadcast_admin_mode,
    state::SharedState,
};

/// Everything the front-desk page needs besides the queue and the match.
pub async fn view(state: &SharedState) -> ViewResponse {
    let config = state.config();
    let tuning = config.tuning();
    ViewResponse {
        venue: config.venue().venue.clone(),
        image: config.display_image().to_string(),
        stats_url: config.venue().stats_url.clone(),
        placeholder_name: tuning.placeholder_name.clone(),
        notice: tuning.notice.clone(),
        admin: state.is_admin(),
        player_count: state.queue().read().await.len(),
    }
}

/// External registration and statistics page.
pub fn stats_url(state: &SharedState) -> String {
    state.config().venue().stats_url.clone()
}

/// Current admin mode.
pub fn admin_mode(state: &SharedState) -> AdminModeResponse {
    AdminModeResponse {
        enabled: state.is_admin(),
    }
}

/// Switch admin mode and tell every client when it changed.
pub fn set_admin_mode(state: &SharedState, enabled: bool) -> AdminModeResponse {
    if state.set_admin(enabled) {
        info!(enabled, "admin mode switched");
        broadcast_admin_mode(state, enabled);
    }
    admin_mode(state)
}
