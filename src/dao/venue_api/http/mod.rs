mod client;
mod config;
mod error;
mod models;

pub use client::HttpVenueApi;
pub use config::HttpApiConfig;
pub use error::{HttpApiError, HttpApiResult};

use crate::dao::remote::RemoteError;

impl From<HttpApiError> for RemoteError {
    fn from(err: HttpApiError) -> Self {
        if err.is_not_found() {
            RemoteError::not_found(err.to_string())
        } else {
            RemoteError::unavailable(err.to_string(), err)
        }
    }
}
