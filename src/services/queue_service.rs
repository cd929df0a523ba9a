use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::IdempotencyKey,
        remote::{RemoteError, RemoteResult},
    },
    dto::queue::QueueView,
    error::ServiceError,
    services::{
        command_queue::{CommandTicket, CommandWork},
        sse_events::{broadcast_alert, broadcast_queue_updated},
    },
    state::{QueueStore, SharedState},
};

/// Alert shown when the backend does not know the player being added or renamed.
pub const REGISTRATION_REQUIRED: &str = "Please register on the player registration page first.";

/// Current queue as shown to clients.
pub async fn snapshot(state: &SharedState) -> QueueView {
    let queue = state.queue().read().await;
    view_of(state, &queue)
}

/// Fetch the queue from the venue backend and replace the local mirror.
///
/// Returns whether the answer was applied; answers overtaken by a newer refresh
/// or by a confirmed mutation are discarded.
pub async fn refresh(state: &SharedState) -> RemoteResult<bool> {
    let ticket = state.queue().write().await.issue_refresh();
    let names = state.api().list_players().await?;

    let applied = {
        let mut queue = state.queue().write().await;
        queue
            .apply_refresh(ticket, names)
            .then(|| view_of(state, &queue))
    };

    match applied {
        Some(view) => {
            broadcast_queue_updated(state, &view);
            Ok(true)
        }
        None => {
            debug!(?ticket, "discarding stale queue refresh");
            Ok(false)
        }
    }
}

/// Refresh on demand; failures are logged and the current view is returned.
pub async fn refresh_and_snapshot(state: &SharedState) -> QueueView {
    if let Err(err) = refresh(state).await {
        warn!(error = %err, "manual queue refresh failed");
    }
    snapshot(state).await
}

/// Append `name` to the queue. Blank names are ignored.
pub async fn add_player(state: &SharedState, name: &str) -> QueueView {
    let name = name.trim();
    if name.is_empty() {
        debug!("ignoring add with a blank name");
        return snapshot(state).await;
    }

    add_named(state, name.to_string(), true).await
}

/// Append the configured empty-slot name to the queue.
pub async fn add_placeholder(state: &SharedState) -> QueueView {
    let name = state.config().tuning().placeholder_name.clone();
    add_named(state, name, false).await
}

/// Remove the player `id` from the queue.
pub async fn remove_player(state: &SharedState, id: Uuid) -> Result<QueueView, ServiceError> {
    if state.queue().read().await.position_of(id).is_none() {
        return Err(ServiceError::NotFound(format!("player {id} is not queued")));
    }

    let key = Uuid::new_v4();
    let ticket = state
        .commands()
        .submit("remove_player", key, removal_work(state, id, key));
    settle(state, ticket).await;
    Ok(snapshot(state).await)
}

/// Rename the player `id`, showing the new name until the backend answers.
///
/// Blank names are ignored. The previous name comes back if the backend refuses.
pub async fn rename_player(
    state: &SharedState,
    id: Uuid,
    new_name: &str,
) -> Result<QueueView, ServiceError> {
    let name = new_name.trim().to_string();
    let key = Uuid::new_v4();

    let view = {
        let mut queue = state.queue().write().await;
        if queue.position_of(id).is_none() {
            return Err(ServiceError::NotFound(format!("player {id} is not queued")));
        }
        if name.is_empty() {
            debug!(%id, "ignoring rename to a blank name");
            return Ok(view_of(state, &queue));
        }
        queue.begin_rename(id, name.clone(), key);
        view_of(state, &queue)
    };
    broadcast_queue_updated(state, &view);

    let ticket = state
        .commands()
        .submit("rename_player", key, rename_work(state, id, name, key));
    settle(state, ticket).await;
    Ok(snapshot(state).await)
}

/// Clear the alert shown to the admin.
pub async fn dismiss_alert(state: &SharedState) -> QueueView {
    let (view, cleared) = {
        let mut queue = state.queue().write().await;
        let cleared = queue.clear_alert();
        (view_of(state, &queue), cleared)
    };
    if cleared {
        broadcast_alert(state, None);
    }
    view
}

/// Enqueue the removal of every entry in `ids`, in order.
pub fn remove_contestants(state: &SharedState, ids: &[Uuid]) -> Vec<CommandTicket> {
    ids.iter()
        .map(|id| {
            let key = Uuid::new_v4();
            state
                .commands()
                .submit("remove_contestant", key, removal_work(state, *id, key))
        })
        .collect()
}

fn view_of(state: &SharedState, queue: &QueueStore) -> QueueView {
    let players: Vec<_> = queue.entries().into_iter().map(Into::into).collect();
    QueueView {
        venue: state.config().venue().venue.clone(),
        count: players.len(),
        players,
        alert: queue.alert().map(str::to_string),
    }
}

async fn add_named(state: &SharedState, name: String, alert_when_unknown: bool) -> QueueView {
    let key = Uuid::new_v4();
    let call = state.api().add_player(name.clone(), key);
    let work_state = state.clone();
    let work: CommandWork = Box::pin(async move {
        let outcome = call.await;
        match &outcome {
            Ok(()) => confirm(&work_state, |_| {}).await,
            Err(err) if err.is_not_found() && alert_when_unknown => {
                raise_registration_alert(&work_state, |_| {}).await
            }
            Err(_) => {}
        }
        outcome
    });

    info!(name = %name, "adding player to queue");
    let ticket = state.commands().submit("add_player", key, work);
    settle(state, ticket).await;
    snapshot(state).await
}

fn removal_work(state: &SharedState, id: Uuid, key: IdempotencyKey) -> CommandWork {
    let state = state.clone();
    Box::pin(async move {
        let position = state.queue().read().await.position_of(id);
        let Some(position) = position else {
            return Err(RemoteError::not_found(format!("player {id} left the queue")));
        };

        let outcome = state.api().remove_player(position, key).await;
        if outcome.is_ok() {
            confirm(&state, |queue| {
                queue.confirm_removal(id);
            })
            .await;
        }
        outcome
    })
}

fn rename_work(state: &SharedState, id: Uuid, name: String, key: IdempotencyKey) -> CommandWork {
    let state = state.clone();
    Box::pin(async move {
        let position = state.queue().read().await.position_of(id);
        let Some(position) = position else {
            state.queue().write().await.finish_rename(id, key, false);
            return Err(RemoteError::not_found(format!("player {id} left the queue")));
        };

        let outcome = state.api().rename_player(position, name, key).await;
        match &outcome {
            Ok(()) => {
                confirm(&state, |queue| {
                    queue.finish_rename(id, key, true);
                })
                .await
            }
            Err(err) if err.is_not_found() => {
                raise_registration_alert(&state, |queue| {
                    queue.finish_rename(id, key, false);
                })
                .await
            }
            Err(_) => {
                let view = {
                    let mut queue = state.queue().write().await;
                    queue.finish_rename(id, key, false);
                    view_of(&state, &queue)
                };
                broadcast_queue_updated(&state, &view);
            }
        }
        outcome
    })
}

/// Apply a confirmed mutation locally; any confirmed mutation clears the alert.
async fn confirm(state: &SharedState, apply: impl FnOnce(&mut QueueStore)) {
    let (view, cleared) = {
        let mut queue = state.queue().write().await;
        apply(&mut *queue);
        queue.mark_mutation_confirmed();
        let cleared = queue.clear_alert();
        (view_of(state, &queue), cleared)
    };

    if cleared {
        broadcast_alert(state, None);
    }
    broadcast_queue_updated(state, &view);
}

async fn raise_registration_alert(state: &SharedState, apply: impl FnOnce(&mut QueueStore)) {
    let view = {
        let mut queue = state.queue().write().await;
        apply(&mut *queue);
        queue.set_alert(REGISTRATION_REQUIRED);
        view_of(state, &queue)
    };

    broadcast_alert(state, Some(REGISTRATION_REQUIRED.to_string()));
    broadcast_queue_updated(state, &view);
}

/// Wait for `ticket` and pull the queue again when the mutation went through.
async fn settle(state: &SharedState, ticket: CommandTicket) {
    if ticket.outcome().await.is_ok() {
        if let Err(err) = refresh(state).await {
            warn!(error = %err, "queue refresh after mutation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeVenueApi, test_state};

    async fn loaded(names: &[&str]) -> (SharedState, FakeVenueApi) {
        let api = FakeVenueApi::with_players(names);
        let state = test_state(&api);
        assert!(refresh(&state).await.unwrap());
        (state, api)
    }

    fn names(view: &QueueView) -> Vec<&str> {
        view.players.iter().map(|player| player.name.as_str()).collect()
    }

    #[tokio::test]
    async fn refresh_mirrors_backend_queue() {
        let (state, _api) = loaded(&["A", "B"]).await;
        let view = snapshot(&state).await;
        assert_eq!(names(&view), vec!["A", "B"]);
        assert_eq!(view.count, 2);
        assert_eq!(view.venue, "중화 1호점");
        assert_eq!(view.alert, None);
    }

    #[tokio::test]
    async fn add_appends_and_refreshes() {
        let (state, api) = loaded(&["A"]).await;
        let view = add_player(&state, "  B  ").await;
        assert_eq!(names(&view), vec!["A", "B"]);
        assert_eq!(api.players(), vec!["A", "B"]);
        assert_eq!(api.keys().len(), 1);
    }

    #[tokio::test]
    async fn blank_add_makes_no_call() {
        let (state, api) = loaded(&["A"]).await;
        let view = add_player(&state, "   ").await;
        assert_eq!(names(&view), vec!["A"]);
        assert!(api.keys().is_empty());
    }

    #[tokio::test]
    async fn unregistered_add_raises_alert_until_next_success() {
        let (state, api) = loaded(&[]).await;
        api.register_only(&["Kim"]);

        let view = add_player(&state, "Lee").await;
        assert_eq!(view.alert.as_deref(), Some(REGISTRATION_REQUIRED));
        assert!(view.players.is_empty());

        let view = add_player(&state, "Kim").await;
        assert_eq!(view.alert, None);
        assert_eq!(names(&view), vec!["Kim"]);
    }

    #[tokio::test]
    async fn dismiss_clears_alert() {
        let (state, api) = loaded(&[]).await;
        api.register_only(&[]);
        add_player(&state, "Lee").await;

        assert_eq!(dismiss_alert(&state).await.alert, None);
    }

    #[tokio::test]
    async fn placeholder_uses_configured_name_without_alert() {
        let (state, api) = loaded(&["A"]).await;
        let view = add_placeholder(&state).await;
        assert_eq!(names(&view), vec!["A", "빈자리"]);

        api.register_only(&["A"]);
        let view = add_placeholder(&state).await;
        assert_eq!(view.alert, None);
    }

    #[tokio::test]
    async fn remove_targets_current_position_of_id() {
        let (state, api) = loaded(&["A", "B", "C"]).await;
        let ids: Vec<Uuid> = snapshot(&state).await.players.iter().map(|p| p.id).collect();

        remove_player(&state, ids[0]).await.unwrap();
        let view = remove_player(&state, ids[2]).await.unwrap();
        assert_eq!(names(&view), vec!["B"]);
        assert_eq!(view.players[0].id, ids[1]);
        assert_eq!(api.players(), vec!["B"]);
    }

    #[tokio::test]
    async fn queued_removals_resolve_positions_when_they_run() {
        let (state, api) = loaded(&["A", "B", "C"]).await;
        let ids: Vec<Uuid> = snapshot(&state).await.players.iter().map(|p| p.id).collect();

        for ticket in remove_contestants(&state, &ids[..2]) {
            ticket.outcome().await.unwrap();
        }
        assert_eq!(api.players(), vec!["C"]);
        assert_eq!(names(&snapshot(&state).await), vec!["C"]);
    }

    #[tokio::test]
    async fn remove_unknown_id_is_not_found() {
        let (state, api) = loaded(&["A"]).await;
        let err = remove_player(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(api.keys().is_empty());
    }

    #[tokio::test]
    async fn failed_remove_keeps_queue() {
        let (state, api) = loaded(&["A", "B"]).await;
        let id = snapshot(&state).await.players[0].id;
        api.set_offline(true);

        let view = remove_player(&state, id).await.unwrap();
        assert_eq!(names(&view), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn rename_updates_backend_and_keeps_id() {
        let (state, api) = loaded(&["A", "B"]).await;
        let id = snapshot(&state).await.players[1].id;

        let view = rename_player(&state, id, " Bea ").await.unwrap();
        assert_eq!(names(&view), vec!["A", "Bea"]);
        assert_eq!(view.players[1].id, id);
        assert!(!view.players[1].pending);
        assert_eq!(api.players(), vec!["A", "Bea"]);
    }

    #[tokio::test]
    async fn rejected_rename_reverts_and_alerts() {
        let (state, api) = loaded(&["A", "B"]).await;
        api.register_only(&["A", "B"]);
        let id = snapshot(&state).await.players[1].id;

        let view = rename_player(&state, id, "Zed").await.unwrap();
        assert_eq!(names(&view), vec!["A", "B"]);
        assert_eq!(view.alert.as_deref(), Some(REGISTRATION_REQUIRED));
    }

    #[tokio::test]
    async fn unreachable_rename_reverts_without_alert() {
        let (state, api) = loaded(&["A"]).await;
        let id = snapshot(&state).await.players[0].id;
        api.set_offline(true);

        let view = rename_player(&state, id, "Ann").await.unwrap();
        assert_eq!(names(&view), vec!["A"]);
        assert!(!view.players[0].pending);
        assert_eq!(view.alert, None);
    }

    #[tokio::test]
    async fn blank_rename_is_ignored() {
        let (state, api) = loaded(&["A"]).await;
        let id = snapshot(&state).await.players[0].id;

        let view = rename_player(&state, id, "  ").await.unwrap();
        assert_eq!(names(&view), vec!["A"]);
        assert!(api.keys().is_empty());
    }

    #[tokio::test]
    async fn mutations_carry_distinct_idempotency_keys() {
        let (state, api) = loaded(&["A"]).await;
        add_player(&state, "B").await;
        add_player(&state, "C").await;

        let keys = api.keys();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);
    }
}
