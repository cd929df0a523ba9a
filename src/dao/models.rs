use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Key attached to every mutating call so the backend can drop replays.
pub type IdempotencyKey = Uuid;

/// Mode a match was played in, recorded alongside its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Regular rotation match.
    #[default]
    Normal,
    /// Alternative mode selected by the admin for the next result.
    Special,
}

/// Completed match as submitted to the backend (the venue is added by the client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResultEntity {
    /// Name of the first contestant (front of the queue when the match ended).
    pub player1_name: String,
    /// Points scored by the first contestant.
    pub player1_score: u32,
    /// Name of the second contestant.
    pub player2_name: String,
    /// Points scored by the second contestant.
    pub player2_score: u32,
    /// Whole seconds the match lasted.
    pub match_time: u64,
    /// Mode the match was played in.
    pub match_type: MatchType,
}
