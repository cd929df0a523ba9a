use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        matches::MatchSnapshot,
        queue::QueueView,
        sse::{AlertEvent, MatchTickEvent, ServerEvent, SystemStatus},
        view::AdminModeResponse,
    },
    services::queue_service,
    state::{SharedState, state_machine::MatchPhase},
};

const EVENT_QUEUE_UPDATED: &str = "queue.updated";
const EVENT_MATCH_PHASE: &str = "match.phase";
const EVENT_MATCH_TICK: &str = "match.tick";
const EVENT_ALERT: &str = "alert";
const EVENT_SYSTEM_STATUS: &str = "system.status";
const EVENT_ADMIN_MODE: &str = "admin.mode";

/// Broadcast the current waiting queue.
pub fn broadcast_queue_updated(state: &SharedState, view: &QueueView) {
    send_public_event(state, EVENT_QUEUE_UPDATED, view);
}

/// Broadcast a match phase change, or a change of the match details.
pub async fn broadcast_match_phase(state: &SharedState, phase: &MatchPhase) {
    let snapshot = MatchSnapshot::new(phase, state.match_type().await);
    send_public_event(state, EVENT_MATCH_PHASE, &snapshot);
}

/// Broadcast the stopwatch value of the running match.
pub fn broadcast_match_tick(state: &SharedState, elapsed_secs: u64) {
    send_public_event(state, EVENT_MATCH_TICK, &MatchTickEvent { elapsed_secs });
}

/// Broadcast the alert shown to the admin; `None` once it is cleared.
pub fn broadcast_alert(state: &SharedState, message: Option<String>) {
    send_public_event(state, EVENT_ALERT, &AlertEvent { message });
}

/// Broadcast that the venue backend became reachable or unreachable.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Broadcast that admin mode was switched.
pub fn broadcast_admin_mode(state: &SharedState, enabled: bool) {
    send_public_event(state, EVENT_ADMIN_MODE, &AdminModeResponse { enabled });
}

/// Events replaying the current queue, match and admin mode to a page that just connected.
pub async fn current_state_events(state: &SharedState) -> Vec<ServerEvent> {
    let queue = queue_service::snapshot(state).await;
    let phase = state.match_phase().await;
    let snapshot = MatchSnapshot::new(&phase, state.match_type().await);
    let admin = AdminModeResponse {
        enabled: state.is_admin(),
    };

    [
        public_event(EVENT_QUEUE_UPDATED, &queue),
        public_event(EVENT_MATCH_PHASE, &snapshot),
        public_event(EVENT_ADMIN_MODE, &admin),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    if let Some(event) = public_event(event, payload) {
        state.public_sse().broadcast(event);
    }
}

fn public_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    ServerEvent::json(Some(event.to_string()), payload)
        .inspect_err(|err| warn!(event, error = %err, "failed to serialize public SSE payload"))
        .ok()
}
