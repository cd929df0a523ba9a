use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Everything the front-desk page needs to render its chrome.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewResponse {
    pub venue: String,
    /// Image displayed next to the player count.
    pub image: String,
    /// External registration and statistics page.
    pub stats_url: String,
    /// Name used for empty slots.
    pub placeholder_name: String,
    /// Scrolling notice shown above the queue.
    pub notice: Option<String>,
    pub admin: bool,
    pub player_count: usize,
}

/// Request toggling admin mode.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminModeRequest {
    pub enabled: bool,
}

/// Current admin mode, also broadcast as `admin.mode`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminModeResponse {
    pub enabled: bool,
}
