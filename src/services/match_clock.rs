use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::time::{MissedTickBehavior, interval_at};
use tracing::debug;

use crate::{
    services::sse_events::broadcast_match_tick,
    state::{AppState, MatchPhase, SharedState, state_machine::RunningMatch},
};

const TICK: Duration = Duration::from_secs(1);

/// Start broadcasting the stopwatch of `running` once per second.
///
/// The task stops on its own once the match leaves the running phase; the
/// state keeps its handle so it can be stopped earlier.
pub async fn start(state: &SharedState, running: RunningMatch) {
    let handle = tokio::spawn(run(Arc::downgrade(state), running));
    state.install_clock(handle).await;
}

async fn run(state: Weak<AppState>, running: RunningMatch) {
    let mut ticker = interval_at(running.started_at + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(state) = state.upgrade() else {
            break;
        };

        match state.match_phase().await {
            MatchPhase::Running(current) if current == running => {
                broadcast_match_tick(&state, running.elapsed_secs());
            }
            _ => break,
        }
    }

    debug!("match clock stopped");
}
