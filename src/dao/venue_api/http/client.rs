use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;

use crate::dao::{
    models::{IdempotencyKey, MatchResultEntity},
    remote::RemoteResult,
    venue_api::VenueApi,
};

use super::{
    config::HttpApiConfig,
    error::{HttpApiError, HttpApiResult},
    models::{AddPlayerBody, MatchResultBody, RenamePlayerBody, VenueQuery},
};

const PLAYERS_PATH: &str = "players";
const RESULT_PATH: &str = "result";
const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// REST client for the venue backend, scoped to a single venue.
#[derive(Clone)]
pub struct HttpVenueApi {
    client: Client,
    base_url: Arc<str>,
    venue: Arc<str>,
}

impl HttpVenueApi {
    /// Build the client. No request is sent until the first call.
    pub fn new(config: HttpApiConfig) -> HttpApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| HttpApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            venue: Arc::<str>::from(config.venue),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        self.client.request(method, url)
    }

    fn mutation(&self, method: Method, path: &str, key: IdempotencyKey) -> RequestBuilder {
        self.request(method, path)
            .header(IDEMPOTENCY_KEY_HEADER, key.to_string())
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> HttpApiResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|source| HttpApiError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(path, %status, "venue backend call succeeded");
            Ok(response)
        } else {
            Err(HttpApiError::RequestStatus {
                path: path.to_string(),
                status,
            })
        }
    }

    async fn fetch_players(&self) -> HttpApiResult<Vec<String>> {
        let builder = self.request(Method::GET, PLAYERS_PATH).query(&VenueQuery {
            place: &self.venue,
        });
        let response = self.send(builder, PLAYERS_PATH).await?;
        response
            .json::<Vec<String>>()
            .await
            .map_err(|source| HttpApiError::DecodeResponse {
                path: PLAYERS_PATH.to_string(),
                source,
            })
    }

    async fn post_player(&self, name: &str, key: IdempotencyKey) -> HttpApiResult<()> {
        let builder = self
            .mutation(Method::POST, PLAYERS_PATH, key)
            .json(&AddPlayerBody {
                place: &self.venue,
                name,
            });
        self.send(builder, PLAYERS_PATH).await.map(drop)
    }

    async fn delete_player(&self, index: usize, key: IdempotencyKey) -> HttpApiResult<()> {
        let path = format!("{PLAYERS_PATH}/{index}");
        let builder = self
            .mutation(Method::DELETE, &path, key)
            .query(&VenueQuery { place: &self.venue });
        self.send(builder, &path).await.map(drop)
    }

    async fn put_player(
        &self,
        index: usize,
        new_name: &str,
        key: IdempotencyKey,
    ) -> HttpApiResult<()> {
        let path = format!("{PLAYERS_PATH}/{index}");
        let builder = self
            .mutation(Method::PUT, &path, key)
            .json(&RenamePlayerBody {
                place: &self.venue,
                new_name,
            });
        self.send(builder, &path).await.map(drop)
    }

    async fn post_result(
        &self,
        result: &MatchResultEntity,
        key: IdempotencyKey,
    ) -> HttpApiResult<()> {
        let builder = self
            .mutation(Method::POST, RESULT_PATH, key)
            .json(&MatchResultBody::new(&self.venue, result));
        self.send(builder, RESULT_PATH).await.map(drop)
    }
}

impl VenueApi for HttpVenueApi {
    fn list_players(&self) -> BoxFuture<'static, RemoteResult<Vec<String>>> {
        let api = self.clone();
        Box::pin(async move { api.fetch_players().await.map_err(Into::into) })
    }

    fn add_player(&self, name: String, key: IdempotencyKey) -> BoxFuture<'static, RemoteResult<()>> {
        let api = self.clone();
        Box::pin(async move { api.post_player(&name, key).await.map_err(Into::into) })
    }

    fn remove_player(
        &self,
        index: usize,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        let api = self.clone();
        Box::pin(async move { api.delete_player(index, key).await.map_err(Into::into) })
    }

    fn rename_player(
        &self,
        index: usize,
        new_name: String,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        let api = self.clone();
        Box::pin(async move {
            api.put_player(index, &new_name, key)
                .await
                .map_err(Into::into)
        })
    }

    fn record_result(
        &self,
        result: MatchResultEntity,
        key: IdempotencyKey,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        let api = self.clone();
        Box::pin(async move { api.post_result(&result, key).await.map_err(Into::into) })
    }
}
