use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::MatchType,
    dto::{format_system_time, phase::VisibleMatchPhase},
    state::state_machine::{Contestant, MatchPhase},
};

/// Player snapshotted into the match awaiting its result.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContestantSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<&Contestant> for ContestantSummary {
    fn from(value: &Contestant) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
        }
    }
}

/// Snapshot of the match in progress.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSnapshot {
    pub phase: VisibleMatchPhase,
    /// True while playing and while the result is being entered.
    pub running: bool,
    pub elapsed_secs: u64,
    /// RFC 3339 start time of the current match.
    pub started_at: Option<String>,
    pub contestant_a: Option<ContestantSummary>,
    pub contestant_b: Option<ContestantSummary>,
    pub score_a: u32,
    pub score_b: u32,
    /// Mode recorded with the next result.
    pub match_type: MatchType,
}

impl MatchSnapshot {
    /// Project `phase` for clients.
    pub fn new(phase: &MatchPhase, match_type: MatchType) -> Self {
        let mut snapshot = Self {
            phase: phase.into(),
            running: phase.is_active(),
            elapsed_secs: 0,
            started_at: None,
            contestant_a: None,
            contestant_b: None,
            score_a: 0,
            score_b: 0,
            match_type,
        };

        match phase {
            MatchPhase::Idle => {}
            MatchPhase::Running(running) => {
                snapshot.elapsed_secs = running.elapsed_secs();
                snapshot.started_at = Some(format_system_time(running.started_wall));
            }
            MatchPhase::Recording(recorded) => {
                snapshot.elapsed_secs = recorded.elapsed_secs;
                snapshot.started_at = Some(format_system_time(recorded.started_wall));
                snapshot.contestant_a = Some((&recorded.contestant_a).into());
                snapshot.contestant_b = Some((&recorded.contestant_b).into());
                snapshot.score_a = recorded.score_a;
                snapshot.score_b = recorded.score_b;
            }
        }

        snapshot
    }
}

/// Final score of the match awaiting its result.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitResultRequest {
    pub score_a: u32,
    pub score_b: u32,
}

/// Selects the mode recorded with the next result.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MatchTypeRequest {
    pub match_type: MatchType,
}
