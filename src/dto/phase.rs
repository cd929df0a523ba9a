use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::MatchPhase;

/// Publicly visible match phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleMatchPhase {
    /// No match in progress.
    Idle,
    /// Stopwatch ticking.
    Running,
    /// Match ended, result dialog open.
    Recording,
}

impl From<&MatchPhase> for VisibleMatchPhase {
    fn from(value: &MatchPhase) -> Self {
        match value {
            MatchPhase::Idle => VisibleMatchPhase::Idle,
            MatchPhase::Running(_) => VisibleMatchPhase::Running,
            MatchPhase::Recording(_) => VisibleMatchPhase::Recording,
        }
    }
}
