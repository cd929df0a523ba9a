use tracing::info;

use crate::{
    dao::models::MatchResultEntity,
    dto::matches::MatchSnapshot,
    error::ServiceError,
    services::match_service,
    state::{MatchPhase, SharedState},
};

/// Record the final score of the match awaiting its result and close it.
///
/// Ties are refused without contacting the backend and leave result entry open.
/// The result is posted in the background; its outcome is only logged.
pub async fn submit_result(
    state: &SharedState,
    score_a: u32,
    score_b: u32,
) -> Result<MatchSnapshot, ServiceError> {
    let MatchPhase::Recording(recorded) = state.match_phase().await else {
        return Err(ServiceError::InvalidState(
            "no match result is being entered".into(),
        ));
    };

    if !state.record_scores(score_a, score_b).await {
        return Err(ServiceError::InvalidState(
            "match result is already being closed".into(),
        ));
    }

    if score_a == score_b {
        return Err(ServiceError::InvalidInput("tie not allowed".into()));
    }

    let result = MatchResultEntity {
        player1_name: recorded.contestant_a.name,
        player1_score: score_a,
        player2_name: recorded.contestant_b.name,
        player2_score: score_b,
        match_time: recorded.elapsed_secs,
        match_type: state.match_type().await,
    };
    info!(
        player1 = %result.player1_name,
        player2 = %result.player2_name,
        score_a,
        score_b,
        match_time = result.match_time,
        "submitting match result"
    );

    match_service::close_match(state, Some(result)).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::DEFAULT_TRANSITION_TIMEOUT,
        dao::models::MatchType,
        dto::phase::VisibleMatchPhase,
        services::queue_service,
        testing::{FakeVenueApi, test_state},
    };

    async fn recording(names: &[&str], elapsed: Duration) -> (SharedState, FakeVenueApi) {
        let api = FakeVenueApi::with_players(names);
        let state = test_state(&api);
        queue_service::refresh(&state).await.unwrap();
        match_service::start_match(&state).await.unwrap();
        tokio::time::advance(elapsed).await;
        match_service::end_match(&state).await.unwrap();
        (state, api)
    }

    #[tokio::test(start_paused = true)]
    async fn result_is_posted_and_contestants_leave() {
        let (state, api) = recording(&["A", "B", "C"], Duration::from_secs(37)).await;

        let snapshot = submit_result(&state, 11, 7).await.unwrap();
        assert_eq!(snapshot.phase, VisibleMatchPhase::Idle);
        assert!(!snapshot.running);

        assert_eq!(
            api.results(),
            vec![MatchResultEntity {
                player1_name: "A".into(),
                player1_score: 11,
                player2_name: "B".into(),
                player2_score: 7,
                match_time: 37,
                match_type: MatchType::Normal,
            }]
        );
        assert_eq!(api.players(), vec!["C"]);
        let queue = queue_service::snapshot(&state).await;
        assert_eq!(queue.count, 1);
        assert_eq!(queue.players[0].name, "C");
    }

    #[tokio::test(start_paused = true)]
    async fn tie_is_refused_without_network_call() {
        let (state, api) = recording(&["A", "B"], Duration::from_secs(5)).await;

        let err = submit_result(&state, 9, 9).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(message) if message == "tie not allowed"));
        assert!(api.results().is_empty());
        assert!(api.keys().is_empty());

        let snapshot = match_service::snapshot(&state).await;
        assert_eq!(snapshot.phase, VisibleMatchPhase::Recording);
        assert_eq!((snapshot.score_a, snapshot.score_b), (9, 9));
    }

    #[tokio::test(start_paused = true)]
    async fn resubmitted_result_reuses_idempotency_key() {
        let (state, api) = recording(&["A", "B", "C"], Duration::from_secs(12)).await;

        api.set_delay(Some(DEFAULT_TRANSITION_TIMEOUT + Duration::from_secs(10)));
        let err = submit_result(&state, 11, 4).await.unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
        let snapshot = match_service::snapshot(&state).await;
        assert_eq!(snapshot.phase, VisibleMatchPhase::Recording);

        api.set_delay(None);
        let snapshot = submit_result(&state, 11, 4).await.unwrap();
        assert_eq!(snapshot.phase, VisibleMatchPhase::Idle);
        assert_eq!(api.players(), vec!["C"]);

        let keys = api.result_keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn submit_requires_recording() {
        let api = FakeVenueApi::with_players(&["A", "B"]);
        let state = test_state(&api);
        let err = submit_result(&state, 3, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn selected_match_type_is_recorded() {
        let (state, api) = recording(&["A", "B"], Duration::from_secs(1)).await;
        match_service::set_match_type(&state, MatchType::Special).await;

        submit_result(&state, 0, 3).await.unwrap();
        assert_eq!(api.results()[0].match_type, MatchType::Special);
    }
}
