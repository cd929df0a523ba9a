pub mod queue;
mod sse;
pub mod state_machine;
pub mod transitions;

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, RwLock, watch},
    task::JoinHandle,
    time::timeout,
};
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::{models::MatchType, venue_api::VenueApi},
    error::ServiceError,
    services::command_queue::CommandQueue,
};

pub use self::queue::{QueueEntry, QueueStore, RefreshTicket};
pub use self::sse::SseHub;
pub use self::state_machine::{
    AbortError, ApplyError, MatchEvent, MatchPhase, Plan, PlanError, PlanId,
};
use self::state_machine::MatchStateMachine;

pub type SharedState = Arc<AppState>;
const SSE_CAPACITY: usize = 64;

/// Central application state: the queue mirror, the match in progress and the
/// handles used to reach the venue backend.
pub struct AppState {
    config: Arc<AppConfig>,
    api: Arc<dyn VenueApi>,
    commands: CommandQueue,
    sse: SseHub,
    queue: RwLock<QueueStore>,
    machine: RwLock<MatchStateMachine>,
    match_type: RwLock<MatchType>,
    clock: Mutex<Option<JoinHandle<()>>>,
    admin: watch::Sender<bool>,
    degraded: watch::Sender<bool>,
    transition_gate: Mutex<()>,
    transition_timeout: Duration,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] and start its command worker.
    ///
    /// Must be called from within a Tokio runtime. The application starts in
    /// degraded mode until the first poll of the venue backend succeeds.
    pub fn new(config: AppConfig, api: Arc<dyn VenueApi>) -> SharedState {
        let (admin_tx, _rx) = watch::channel(false);
        let (degraded_tx, _rx) = watch::channel(true);
        let transition_timeout = config.tuning().transition_timeout;
        Arc::new(Self {
            config: Arc::new(config),
            api,
            commands: CommandQueue::spawn(),
            sse: SseHub::new(SSE_CAPACITY),
            queue: RwLock::new(QueueStore::new()),
            machine: RwLock::new(MatchStateMachine::new()),
            match_type: RwLock::new(MatchType::default()),
            clock: Mutex::new(None),
            admin: admin_tx,
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
            transition_timeout,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the venue backend.
    pub fn api(&self) -> Arc<dyn VenueApi> {
        self.api.clone()
    }

    /// Serial queue every mutating backend call goes through.
    pub fn commands(&self) -> &CommandQueue {
        &self.commands
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Local mirror of the waiting queue.
    pub fn queue(&self) -> &RwLock<QueueStore> {
        &self.queue
    }

    /// Snapshot the current phase of the match state machine.
    pub async fn match_phase(&self) -> MatchPhase {
        self.machine.read().await.phase()
    }

    /// Store the scores entered for the match awaiting its result.
    ///
    /// Returns `false` when no match is awaiting a result.
    pub async fn record_scores(&self, score_a: u32, score_b: u32) -> bool {
        let mut sm = self.machine.write().await;
        match sm.recording_mut() {
            Some(recorded) => {
                recorded.score_a = score_a;
                recorded.score_b = score_b;
                true
            }
            None => false,
        }
    }

    /// Match type recorded with the next result.
    pub async fn match_type(&self) -> MatchType {
        *self.match_type.read().await
    }

    /// Select the match type recorded with the next result.
    pub async fn set_match_type(&self, match_type: MatchType) {
        *self.match_type.write().await = match_type;
    }

    /// Keep `handle` as the running match clock, stopping any previous one.
    pub async fn install_clock(&self, handle: JoinHandle<()>) {
        let mut guard = self.clock.lock().await;
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }

    /// Stop the running match clock, if any.
    pub async fn stop_clock(&self) {
        if let Some(handle) = self.clock.lock().await.take() {
            handle.abort();
        }
    }

    /// Whether mutating operations are currently allowed.
    pub fn is_admin(&self) -> bool {
        *self.admin.borrow()
    }

    /// Switch admin mode, returning whether the value changed.
    pub fn set_admin(&self, enabled: bool) -> bool {
        self.admin.send_if_modified(|current| {
            if *current == enabled {
                return false;
            }
            *current = enabled;
            true
        })
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, returning whether the value changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Stop the background work owned by the state.
    pub async fn shutdown(&self) {
        self.stop_clock().await;
        self.commands.shutdown();
    }

    /// Plan a transition to the match state machine, returning the plan.
    async fn plan_transition(&self, event: MatchEvent) -> Result<Plan, PlanError> {
        let mut sm = self.machine.write().await;
        sm.plan(event)
    }

    /// Apply the planned transition to the match state machine, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<MatchPhase, ApplyError> {
        let mut sm = self.machine.write().await;
        sm.apply(plan_id)
    }

    /// Abort a planned transition of the match state machine.
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut sm = self.machine.write().await;
        sm.abort(plan_id)
    }

    /// Run `work` between planning and applying `event`.
    ///
    /// The transition is aborted when `work` fails or exceeds the transition timeout.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: MatchEvent,
        work: F,
    ) -> Result<(T, MatchPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event.clone()).await?;

        let outcome = match timeout(self.transition_timeout, work()).await {
            Ok(result) => result,
            Err(_) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after timeout"
                    );
                }
                drop(gate);
                return Err(ServiceError::Timeout);
            }
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}
