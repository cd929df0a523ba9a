use tracing::{debug, info, warn};

use crate::{
    dao::models::{MatchResultEntity, MatchType},
    dto::matches::MatchSnapshot,
    error::ServiceError,
    services::{match_clock, queue_service, sse_events::broadcast_match_phase},
    state::{
        MatchPhase, SharedState,
        state_machine::{Contestant, MatchEvent, RecordedMatch, RunningMatch},
        transitions::run_transition_with_broadcast,
    },
};

/// Current match as shown to clients.
pub async fn snapshot(state: &SharedState) -> MatchSnapshot {
    MatchSnapshot::new(&state.match_phase().await, state.match_type().await)
}

/// Start the stopwatch for a new match.
pub async fn start_match(state: &SharedState) -> Result<MatchSnapshot, ServiceError> {
    let running = RunningMatch::now();
    run_transition_with_broadcast(state, MatchEvent::Start(running.clone()), || async {
        Ok(())
    })
    .await?;

    match_clock::start(state, running).await;
    info!("match started");
    Ok(snapshot(state).await)
}

/// End the running match and open result entry for the two players at the front.
///
/// With fewer than two players queued nothing happens and the match keeps running.
pub async fn end_match(state: &SharedState) -> Result<MatchSnapshot, ServiceError> {
    let MatchPhase::Running(running) = state.match_phase().await else {
        return Err(ServiceError::InvalidState("no match is running".into()));
    };

    let pair = state.queue().read().await.front_pair();
    let Some((first, second)) = pair else {
        info!("fewer than two players queued; match keeps running");
        return Ok(snapshot(state).await);
    };

    let recorded = RecordedMatch::from_running(
        &running,
        Contestant {
            id: first.id,
            name: first.name,
        },
        Contestant {
            id: second.id,
            name: second.name,
        },
    );
    let elapsed_secs = recorded.elapsed_secs;
    run_transition_with_broadcast(state, MatchEvent::End(recorded), || async { Ok(()) }).await?;

    state.stop_clock().await;
    info!(elapsed_secs, "match ended; awaiting result");
    Ok(snapshot(state).await)
}

/// Close result entry, optionally posting `result`, and drop both contestants from the queue.
///
/// The match only returns to idle once the backend confirmed both removals. On
/// failure or timeout result entry stays open and closing can be retried:
/// contestants are removed by id and the result reuses its idempotency key.
pub async fn close_match(
    state: &SharedState,
    result: Option<MatchResultEntity>,
) -> Result<MatchSnapshot, ServiceError> {
    let MatchPhase::Recording(recorded) = state.match_phase().await else {
        return Err(ServiceError::InvalidState(
            "no match result is being entered".into(),
        ));
    };

    let contestants = [recorded.contestant_a.id, recorded.contestant_b.id];
    let result_key = recorded.result_key;
    run_transition_with_broadcast(state, MatchEvent::Close, || async move {
        if let Some(result) = result {
            let call = state.api().record_result(result, result_key);
            state.commands().dispatch("record_result", result_key, call);
        }

        for ticket in queue_service::remove_contestants(state, &contestants) {
            let key = ticket.key;
            match ticket.outcome().await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    debug!(key = %key, "contestant already left the queue");
                }
                Err(err) => return Err(ServiceError::from(err)),
            }
        }
        Ok(())
    })
    .await
    .inspect_err(|err| warn!(error = %err, "closing match failed; result entry stays open"))?;

    if let Err(err) = queue_service::refresh(state).await {
        warn!(error = %err, "queue refresh after match failed");
    }

    info!("match closed");
    Ok(snapshot(state).await)
}

/// Select the mode recorded with the next result.
pub async fn set_match_type(state: &SharedState, match_type: MatchType) -> MatchSnapshot {
    state.set_match_type(match_type).await;
    let phase = state.match_phase().await;
    broadcast_match_phase(state, &phase).await;
    MatchSnapshot::new(&phase, match_type)
}
