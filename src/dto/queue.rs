use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dto::validation::validate_player_name, state::QueueEntry};

/// Player waiting in the queue.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueuePlayer {
    /// Stable identifier used to address the player in later requests.
    pub id: Uuid,
    /// Zero-based waiting position.
    pub position: usize,
    pub name: String,
    /// True while a rename is being confirmed by the venue backend.
    pub pending: bool,
}

impl From<QueueEntry> for QueuePlayer {
    fn from(entry: QueueEntry) -> Self {
        Self {
            id: entry.id,
            position: entry.position,
            name: entry.name,
            pending: entry.pending,
        }
    }
}

/// Current waiting queue of the venue.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueueView {
    pub venue: String,
    pub players: Vec<QueuePlayer>,
    pub count: usize,
    /// Message the admin must acknowledge, if any.
    pub alert: Option<String>,
}

/// Request to append a player to the queue.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddPlayerRequest {
    /// Registered player name. Blank names are ignored.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
}

/// Request to rename a queued player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RenamePlayerRequest {
    /// New name. Surrounding whitespace is trimmed; blank names are ignored.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
}
