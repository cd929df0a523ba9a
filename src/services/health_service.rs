use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the last poll of the venue backend succeeded.
pub fn health_status(state: &SharedState) -> HealthResponse {
    if state.is_degraded() {
        debug!("healthcheck while venue backend is unreachable");
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
