use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration describing how to reach the venue backend.
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: String,
    pub venue: String,
    pub timeout: Duration,
}

impl HttpApiConfig {
    /// Construct a configuration from explicit base URL and venue identifier.
    pub fn new(base_url: impl Into<String>, venue: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            venue: venue.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
