use std::time::SystemTime;

use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

/// High-level phases a match can be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPhase {
    /// No match is running; the stopwatch is stopped.
    Idle,
    /// A match is being played and the stopwatch is ticking.
    Running(RunningMatch),
    /// The match ended and its result is being entered.
    Recording(RecordedMatch),
}

impl MatchPhase {
    /// Whether a match is in progress (playing or awaiting its result).
    pub fn is_active(&self) -> bool {
        !matches!(self, MatchPhase::Idle)
    }
}

/// Stopwatch anchor of a running match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningMatch {
    /// Monotonic start used to compute elapsed time.
    pub started_at: Instant,
    /// Wall-clock start exposed to clients.
    pub started_wall: SystemTime,
}

impl RunningMatch {
    /// Anchor a new match at the current instant.
    pub fn now() -> Self {
        Self {
            started_at: Instant::now(),
            started_wall: SystemTime::now(),
        }
    }

    /// Whole seconds elapsed since the match started.
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Player snapshotted from the front of the queue when a match ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contestant {
    /// Stable local identifier of the queue entry.
    pub id: Uuid,
    /// Name as displayed when the match ended.
    pub name: String,
}

/// Match awaiting its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMatch {
    pub contestant_a: Contestant,
    pub contestant_b: Contestant,
    /// Frozen stopwatch value.
    pub elapsed_secs: u64,
    pub started_wall: SystemTime,
    /// Score entered for the first contestant.
    pub score_a: u32,
    /// Score entered for the second contestant.
    pub score_b: u32,
    /// Idempotency key of the result post, reused when closing is retried.
    pub result_key: Uuid,
}

impl RecordedMatch {
    /// Freeze `running` with the two contestants at the front of the queue.
    pub fn from_running(
        running: &RunningMatch,
        contestant_a: Contestant,
        contestant_b: Contestant,
    ) -> Self {
        Self {
            contestant_a,
            contestant_b,
            elapsed_secs: running.elapsed_secs(),
            started_wall: running.started_wall,
            score_a: 0,
            score_b: 0,
            result_key: Uuid::new_v4(),
        }
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// Admin starts the stopwatch.
    Start(RunningMatch),
    /// Admin ends the match; contestants are snapshotted.
    End(RecordedMatch),
    /// Result dialog closed, with or without a submitted result.
    Close,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: MatchPhase,
    /// The event that cannot be applied from this phase.
    pub event: MatchEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: MatchPhase,
        /// Current phase.
        actual: MatchPhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: MatchPhase,
    /// Phase the state machine will transition to.
    pub to: MatchPhase,
    /// Event that triggered this transition.
    pub event: MatchEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
}

/// State machine driving a single match from start to result.
#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    phase: MatchPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for MatchStateMachine {
    fn default() -> Self {
        Self {
            phase: MatchPhase::Idle,
            version: 0,
            pending: None,
        }
    }
}

impl MatchStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase.clone()
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Mutable access to the match awaiting its result.
    ///
    /// Returns `None` while a transition is pending so the planned phase stays intact.
    pub fn recording_mut(&mut self) -> Option<&mut RecordedMatch> {
        if self.pending.is_some() {
            return None;
        }
        match &mut self.phase {
            MatchPhase::Recording(recorded) => Some(recorded),
            _ => None,
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: MatchEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event.clone())
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase.clone(),
            to: next,
            event,
            version_next: self.version + 1,
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<MatchPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase.clone(),
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase.clone())
    }

    /// Abort a planned transition without applying it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = match (self.phase.clone(), event) {
            (MatchPhase::Idle, MatchEvent::Start(running)) => MatchPhase::Running(running),
            (MatchPhase::Running(_), MatchEvent::End(recorded)) => MatchPhase::Recording(recorded),
            (MatchPhase::Recording(_), MatchEvent::Close) => MatchPhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut MatchStateMachine, event: MatchEvent) -> MatchPhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    fn contestant(name: &str) -> Contestant {
        Contestant {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    fn recorded(running: &RunningMatch) -> RecordedMatch {
        RecordedMatch::from_running(running, contestant("A"), contestant("B"))
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = MatchStateMachine::new();
        assert_eq!(sm.phase(), MatchPhase::Idle);
        assert!(!sm.phase().is_active());
        assert_eq!(sm.version(), 0);
    }

    #[tokio::test]
    async fn full_match_cycle() {
        let mut sm = MatchStateMachine::new();
        let running = RunningMatch::now();

        assert_eq!(
            apply(&mut sm, MatchEvent::Start(running.clone())),
            MatchPhase::Running(running.clone())
        );

        let result = recorded(&running);
        assert_eq!(
            apply(&mut sm, MatchEvent::End(result.clone())),
            MatchPhase::Recording(result)
        );
        assert!(sm.phase().is_active());

        assert_eq!(apply(&mut sm, MatchEvent::Close), MatchPhase::Idle);
        assert_eq!(sm.version(), 3);
    }

    #[tokio::test]
    async fn start_is_rejected_while_running() {
        let mut sm = MatchStateMachine::new();
        apply(&mut sm, MatchEvent::Start(RunningMatch::now()));

        let err = sm.plan(MatchEvent::Start(RunningMatch::now())).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert!(matches!(invalid.from, MatchPhase::Running(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn close_requires_recording() {
        let mut sm = MatchStateMachine::new();
        let err = sm.plan(MatchEvent::Close).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, MatchPhase::Idle);
                assert_eq!(invalid.event, MatchEvent::Close);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn end_requires_running() {
        let mut sm = MatchStateMachine::new();
        let running = RunningMatch::now();
        let err = sm.plan(MatchEvent::End(recorded(&running))).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn second_plan_is_rejected_while_pending() {
        let mut sm = MatchStateMachine::new();
        sm.plan(MatchEvent::Start(RunningMatch::now())).unwrap();
        assert_eq!(
            sm.plan(MatchEvent::Start(RunningMatch::now())).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[tokio::test]
    async fn abort_clears_pending() {
        let mut sm = MatchStateMachine::new();
        let plan = sm.plan(MatchEvent::Start(RunningMatch::now())).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
        assert_eq!(sm.phase(), MatchPhase::Idle);
    }

    #[tokio::test]
    async fn apply_with_wrong_id_keeps_plan() {
        let mut sm = MatchStateMachine::new();
        let plan = sm.plan(MatchEvent::Start(RunningMatch::now())).unwrap();
        let err = sm.apply(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApplyError::IdMismatch { expected, .. } if expected == plan.id));
        assert!(sm.apply(plan.id).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn recorded_match_freezes_elapsed_seconds() {
        let mut sm = MatchStateMachine::new();
        let running = RunningMatch::now();
        apply(&mut sm, MatchEvent::Start(running.clone()));

        tokio::time::advance(std::time::Duration::from_millis(12_400)).await;
        apply(&mut sm, MatchEvent::End(recorded(&running)));

        let scores = sm.recording_mut().unwrap();
        assert_eq!(scores.elapsed_secs, 12);
        scores.score_a = 11;
        match sm.phase() {
            MatchPhase::Recording(recorded) => assert_eq!(recorded.score_a, 11),
            other => panic!("expected recording, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scores_are_locked_while_close_is_pending() {
        let mut sm = MatchStateMachine::new();
        let running = RunningMatch::now();
        apply(&mut sm, MatchEvent::Start(running.clone()));
        apply(&mut sm, MatchEvent::End(recorded(&running)));

        let plan = sm.plan(MatchEvent::Close).unwrap();
        assert!(sm.recording_mut().is_none());
        sm.abort(plan.id).unwrap();
        assert!(sm.recording_mut().is_some());
    }
}
