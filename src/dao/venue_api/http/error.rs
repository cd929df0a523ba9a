//! Error types raised by the HTTP venue client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`HttpApiError`] failures.
pub type HttpApiResult<T> = Result<T, HttpApiError>;

/// Failures that can occur while talking to the venue backend over HTTP.
#[derive(Debug, Error)]
pub enum HttpApiError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build venue backend client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or timed out.
    #[error("failed to send venue backend request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend returned an unexpected status code.
    #[error("unexpected venue backend response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode venue backend response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl HttpApiError {
    /// Whether the backend answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HttpApiError::RequestStatus {
                status: StatusCode::NOT_FOUND,
                ..
            }
        )
    }
}
