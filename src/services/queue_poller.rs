use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    services::{queue_service, sse_events::broadcast_system_status},
    state::SharedState,
};

/// Poll the venue backend forever, keeping the queue mirror and the degraded flag current.
///
/// The first poll runs immediately. Polls never overlap: a slow answer delays the next one.
pub async fn run(state: SharedState) {
    let period = state.config().tuning().poll_interval;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_ms = period.as_millis() as u64, "queue poller started");

    loop {
        ticker.tick().await;
        poll_once(&state).await;
    }
}

/// Refresh the queue once and record whether the backend answered.
pub async fn poll_once(state: &SharedState) {
    match queue_service::refresh(state).await {
        Ok(_) => {
            if state.update_degraded(false) {
                info!("venue backend reachable; leaving degraded mode");
                broadcast_system_status(state, false);
            }
        }
        Err(err) => {
            if state.update_degraded(true) {
                warn!(error = %err, "venue backend unreachable; entering degraded mode");
                broadcast_system_status(state, true);
            } else {
                debug!(error = %err, "queue poll failed");
            }
        }
    }
}
