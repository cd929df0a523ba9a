use std::future::Future;

use tracing::debug;

use crate::{
    dto::phase::VisibleMatchPhase,
    error::ServiceError,
    services::sse_events::broadcast_match_phase,
    state::{SharedState, state_machine::MatchEvent},
};

/// Run a match transition and its backend work, then tell connected pages
/// about the phase the match landed in.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    state: &SharedState,
    event: MatchEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let (res, next) = state.run_transition(event, work).await?;
    debug!(phase = ?VisibleMatchPhase::from(&next), "match phase applied");
    broadcast_match_phase(state, &next).await;
    Ok(res)
}
