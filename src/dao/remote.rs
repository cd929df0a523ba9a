use std::error::Error;
use thiserror::Error;

/// Result alias for calls against the remote venue backend.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Error raised by venue backends regardless of the underlying transport.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The backend answered with a 404-class status (unknown player or position).
    #[error("not found on remote backend: {message}")]
    NotFound { message: String },
    /// The backend could not be reached or answered unexpectedly.
    #[error("remote backend unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl RemoteError {
    /// Construct a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        RemoteError::NotFound {
            message: message.into(),
        }
    }

    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        RemoteError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Whether the backend signalled a 404-class answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}
