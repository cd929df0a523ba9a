pub mod http;

use futures::future::BoxFuture;

use crate::dao::{
    models::{IdempotencyKey, MatchResultEntity},
    remote::RemoteResult,
};

/// Abstraction over the REST backend owning the queue of a single venue.
///
/// Positions are the only addressing scheme the backend understands; callers
/// resolve stable local identifiers to positions right before each call.
pub trait VenueApi: Send + Sync {
    fn list_players(&self) -> BoxFuture<'static, RemoteResult<Vec<String>>>;
    fn add_player(&self, name: String, key: IdempotencyKey) -> BoxFuture<'static, RemoteResult<()>>;
    fn remove_player(
        &self,
        index: usize,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>>;
    fn rename_player(
        &self,
        index: usize,
        new_name: String,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>>;
    fn record_result(
        &self,
        result: MatchResultEntity,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>>;
}
