//! In-memory venue backend shared by unit and integration tests.
//!
//! Built for `cfg(test)` and with the `testing` feature.

use std::{
    collections::HashSet,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::BoxFuture;

use crate::{
    config::{AppConfig, Tuning, VenueConfig},
    dao::{
        models::{IdempotencyKey, MatchResultEntity},
        remote::{RemoteError, RemoteResult},
        venue_api::VenueApi,
    },
    state::{AppState, SharedState},
};

#[derive(Default)]
struct FakeBackend {
    players: Vec<String>,
    registered: Option<HashSet<String>>,
    offline: bool,
    delay: Option<Duration>,
    results: Vec<MatchResultEntity>,
    result_keys: Vec<IdempotencyKey>,
    keys: Vec<IdempotencyKey>,
}

impl FakeBackend {
    fn check_online(&self) -> RemoteResult<()> {
        if self.offline {
            return Err(RemoteError::unavailable(
                "fake backend offline".into(),
                io::Error::other("offline"),
            ));
        }
        Ok(())
    }

    fn check_registered(&self, name: &str) -> RemoteResult<()> {
        match &self.registered {
            Some(names) if !names.contains(name) => {
                Err(RemoteError::not_found(format!("{name} is not registered")))
            }
            _ => Ok(()),
        }
    }
}

/// Venue backend keeping its queue in memory.
#[derive(Clone, Default)]
pub struct FakeVenueApi {
    inner: Arc<Mutex<FakeBackend>>,
}

impl FakeVenueApi {
    /// Backend whose queue starts with `names`.
    pub fn with_players(names: &[&str]) -> Self {
        let api = Self::default();
        api.inner.lock().unwrap().players = names.iter().map(|name| name.to_string()).collect();
        api
    }

    /// Queue as stored by the backend.
    pub fn players(&self) -> Vec<String> {
        self.inner.lock().unwrap().players.clone()
    }

    /// Results posted so far.
    pub fn results(&self) -> Vec<MatchResultEntity> {
        self.inner.lock().unwrap().results.clone()
    }

    /// Idempotency keys of the result posts, in call order.
    pub fn result_keys(&self) -> Vec<IdempotencyKey> {
        self.inner.lock().unwrap().result_keys.clone()
    }

    /// Idempotency keys received, in call order.
    pub fn keys(&self) -> Vec<IdempotencyKey> {
        self.inner.lock().unwrap().keys.clone()
    }

    /// Fail every call as unreachable while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }

    /// Hold every call for `delay` before answering; read when the call runs.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.inner.lock().unwrap().delay = delay;
    }

    /// Answer 404 to adds and renames of any other name.
    pub fn register_only(&self, names: &[&str]) {
        self.inner.lock().unwrap().registered =
            Some(names.iter().map(|name| name.to_string()).collect());
    }

    /// Append a player as another front desk would.
    pub fn push_remote(&self, name: &str) {
        self.inner.lock().unwrap().players.push(name.to_string());
    }

    fn call<T, F>(&self, op: F) -> BoxFuture<'static, RemoteResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut FakeBackend) -> RemoteResult<T> + Send + 'static,
    {
        let inner = self.inner.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            let delay = inner.lock().unwrap().delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let mut backend = inner.lock().unwrap();
            backend.check_online()?;
            op(&mut *backend)
        })
    }
}

impl VenueApi for FakeVenueApi {
    fn list_players(&self) -> BoxFuture<'static, RemoteResult<Vec<String>>> {
        self.call(|backend| Ok(backend.players.clone()))
    }

    fn add_player(&self, name: String, key: IdempotencyKey) -> BoxFuture<'static, RemoteResult<()>> {
        self.call(move |backend| {
            backend.keys.push(key);
            backend.check_registered(&name)?;
            backend.players.push(name);
            Ok(())
        })
    }

    fn remove_player(
        &self,
        index: usize,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        self.call(move |backend| {
            backend.keys.push(key);
            if index >= backend.players.len() {
                return Err(RemoteError::not_found(format!("no player at {index}")));
            }
            backend.players.remove(index);
            Ok(())
        })
    }

    fn rename_player(
        &self,
        index: usize,
        new_name: String,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        self.call(move |backend| {
            backend.keys.push(key);
            backend.check_registered(&new_name)?;
            let slot = backend
                .players
                .get_mut(index)
                .ok_or_else(|| RemoteError::not_found(format!("no player at {index}")))?;
            *slot = new_name;
            Ok(())
        })
    }

    fn record_result(
        &self,
        result: MatchResultEntity,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        self.call(move |backend| {
            backend.keys.push(key);
            backend.result_keys.push(key);
            backend.results.push(result);
            Ok(())
        })
    }
}

/// Venue configuration shared by the unit tests.
pub fn test_config() -> AppConfig {
    AppConfig::new(
        VenueConfig::new("http://backend.test", "중화 1호점", "http://stats.test/register"),
        Tuning::default(),
    )
}

/// Fresh state backed by `api`, queue not loaded yet.
pub fn test_state(api: &FakeVenueApi) -> SharedState {
    AppState::new(test_config(), Arc::new(api.clone()))
}
