//! Application-level configuration: the venue this instance serves and runtime tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use thiserror::Error;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON tuning file.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "VENUE_QUEUE_CONFIG_PATH";
const API_URL_ENV: &str = "VENUE_QUEUE_API_URL";
const PLACE_ENV: &str = "VENUE_QUEUE_PLACE";
const STATS_URL_ENV: &str = "VENUE_QUEUE_STATS_URL";

/// Interval between two polls of the remote queue.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);
/// Per-request timeout applied to the venue backend client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound for the backend work of a match transition, queued commands included.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(30);
/// Literal name the backend understands as an empty slot in the rotation.
pub const DEFAULT_PLACEHOLDER_NAME: &str = "빈자리";
/// Scrolling notice shown unless the tuning file sets another one, or a blank one to hide it.
pub const DEFAULT_NOTICE: &str = "기록안되고 있으면 새로고침 한번 해주세요! ----- 테스트 기간 동안 데이터가 유실될 수 있습니다. 양해부탁드립니다 -----";
/// Image shown when no prefix rule matches the venue.
pub const DEFAULT_IMAGE: &str = "recordism.png";

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
}

/// Deployment-specific values selecting which venue this instance serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueConfig {
    /// Base URL of the venue backend REST API.
    pub api_base_url: String,
    /// Venue identifier sent as `place` with every backend call.
    pub venue: String,
    /// External registration/statistics page.
    pub stats_url: String,
}

impl VenueConfig {
    /// Construct a venue configuration from explicit values.
    pub fn new(
        api_base_url: impl Into<String>,
        venue: impl Into<String>,
        stats_url: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            venue: venue.into(),
            stats_url: stats_url.into(),
        }
    }

    /// Build the venue configuration from the expected environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            required_env(API_URL_ENV)?,
            required_env(PLACE_ENV)?,
            required_env(STATS_URL_ENV)?,
        ))
    }
}

/// Prefix rule mapping a venue name to its display image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRule {
    pub prefix: String,
    pub image: String,
}

/// Optional runtime knobs loaded from the JSON tuning file.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub transition_timeout: Duration,
    pub placeholder_name: String,
    /// Scrolling notice shown above the queue, if any.
    pub notice: Option<String>,
    pub images: Vec<ImageRule>,
    pub default_image: String,
}

impl Tuning {
    /// Load tuning from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawTuning>(&contents) {
                Ok(raw) => {
                    let tuning: Self = raw.into();
                    info!(
                        path = %path.display(),
                        poll_interval_ms = tuning.poll_interval.as_millis() as u64,
                        "loaded tuning from config"
                    );
                    tuning
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Return the image of the first rule whose prefix matches `venue`.
    pub fn image_for(&self, venue: &str) -> &str {
        self.images
            .iter()
            .find(|rule| venue.starts_with(&rule.prefix))
            .map(|rule| rule.image.as_str())
            .unwrap_or(self.default_image.as_str())
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            transition_timeout: DEFAULT_TRANSITION_TIMEOUT,
            placeholder_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
            notice: Some(DEFAULT_NOTICE.to_string()),
            images: default_images(),
            default_image: DEFAULT_IMAGE.to_string(),
        }
    }
}

/// Immutable runtime configuration handed to the state at construction.
#[derive(Debug, Clone)]
pub struct AppConfig {
    venue: VenueConfig,
    tuning: Tuning,
}

impl AppConfig {
    /// Assemble a configuration from its two halves.
    pub fn new(venue: VenueConfig, tuning: Tuning) -> Self {
        Self { venue, tuning }
    }

    /// Read the venue from the environment and tuning from disk.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(VenueConfig::from_env()?, Tuning::load()))
    }

    /// Venue selection values.
    pub fn venue(&self) -> &VenueConfig {
        &self.venue
    }

    /// Runtime knobs.
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Image displayed next to the player count for this venue.
    pub fn display_image(&self) -> &str {
        self.tuning.image_for(&self.venue.venue)
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
/// JSON representation of the tuning file located at [`DEFAULT_CONFIG_PATH`].
struct RawTuning {
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default)]
    poll_interval_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default)]
    request_timeout_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default)]
    transition_timeout_ms: Option<Duration>,
    #[serde(default)]
    placeholder_name: Option<String>,
    #[serde(default)]
    notice: Option<String>,
    #[serde(default)]
    images: Option<Vec<RawImageRule>>,
    #[serde(default)]
    default_image: Option<String>,
}

impl From<RawTuning> for Tuning {
    fn from(value: RawTuning) -> Self {
        let defaults = Tuning::default();
        Self {
            poll_interval: non_zero(value.poll_interval_ms, "poll_interval_ms")
                .unwrap_or(defaults.poll_interval),
            request_timeout: non_zero(value.request_timeout_ms, "request_timeout_ms")
                .unwrap_or(defaults.request_timeout),
            transition_timeout: non_zero(value.transition_timeout_ms, "transition_timeout_ms")
                .unwrap_or(defaults.transition_timeout),
            placeholder_name: value
                .placeholder_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.placeholder_name),
            notice: match value.notice {
                Some(notice) if notice.trim().is_empty() => None,
                Some(notice) => Some(notice),
                None => defaults.notice,
            },
            images: value
                .images
                .map(|rules| rules.into_iter().map(Into::into).collect())
                .unwrap_or(defaults.images),
            default_image: value.default_image.unwrap_or(defaults.default_image),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single image prefix rule.
struct RawImageRule {
    prefix: String,
    image: String,
}

impl From<RawImageRule> for ImageRule {
    fn from(value: RawImageRule) -> Self {
        Self {
            prefix: value.prefix,
            image: value.image,
        }
    }
}

fn non_zero(value: Option<Duration>, field: &'static str) -> Option<Duration> {
    match value {
        Some(duration) if duration.is_zero() => {
            warn!(field, "zero duration in config; using default");
            None
        }
        other => other,
    }
}

fn required_env(var: &'static str) -> Result<String, ConfigError> {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingEnvVar { var })
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in venue images shipped with the front-end.
fn default_images() -> Vec<ImageRule> {
    vec![
        ImageRule {
            prefix: "중화".to_string(),
            image: "junghwa.png".to_string(),
        },
        ImageRule {
            prefix: "서경".to_string(),
            image: "seokyeong.png".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_is_selected_by_venue_prefix() {
        let tuning = Tuning::default();
        assert_eq!(tuning.image_for("중화 탁구장"), "junghwa.png");
        assert_eq!(tuning.image_for("서경대 2층"), "seokyeong.png");
        assert_eq!(tuning.image_for("recordism"), DEFAULT_IMAGE);
        assert_eq!(tuning.image_for("본점 중화"), DEFAULT_IMAGE);
    }

    #[test]
    fn empty_tuning_file_keeps_defaults() {
        let raw: RawTuning = serde_json::from_str("{}").unwrap();
        assert_eq!(Tuning::from(raw), Tuning::default());
    }

    #[test]
    fn tuning_file_overrides_selected_fields() {
        let raw: RawTuning = serde_json::from_str(
            r#"{
                "poll_interval_ms": 2500,
                "placeholder_name": "open slot",
                "notice": "Refresh once if results are not recorded",
                "images": [{ "prefix": "Main", "image": "main.png" }]
            }"#,
        )
        .unwrap();
        let tuning = Tuning::from(raw);

        assert_eq!(tuning.poll_interval, Duration::from_millis(2_500));
        assert_eq!(tuning.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(tuning.placeholder_name, "open slot");
        assert_eq!(
            tuning.notice.as_deref(),
            Some("Refresh once if results are not recorded")
        );
        assert_eq!(tuning.image_for("Main hall"), "main.png");
        assert_eq!(tuning.image_for("중화"), DEFAULT_IMAGE);
    }

    #[test]
    fn notice_defaults_to_refresh_hint_and_can_be_hidden() {
        assert_eq!(Tuning::default().notice.as_deref(), Some(DEFAULT_NOTICE));

        let raw: RawTuning = serde_json::from_str(r#"{ "notice": " " }"#).unwrap();
        assert_eq!(Tuning::from(raw).notice, None);
    }

    #[test]
    fn transition_timeout_is_tunable() {
        let raw: RawTuning = serde_json::from_str(r#"{ "transition_timeout_ms": 12000 }"#).unwrap();
        assert_eq!(Tuning::from(raw).transition_timeout, Duration::from_secs(12));

        let raw: RawTuning = serde_json::from_str(r#"{ "transition_timeout_ms": 0 }"#).unwrap();
        assert_eq!(Tuning::from(raw).transition_timeout, DEFAULT_TRANSITION_TIMEOUT);
    }

    #[test]
    fn zero_poll_interval_falls_back_to_default() {
        let raw: RawTuning =
            serde_json::from_str(r#"{ "poll_interval_ms": 0, "placeholder_name": "  " }"#)
                .unwrap();
        let tuning = Tuning::from(raw);
        assert_eq!(tuning.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(tuning.placeholder_name, DEFAULT_PLACEHOLDER_NAME);
    }

    #[test]
    fn display_image_uses_configured_venue() {
        let config = AppConfig::new(
            VenueConfig::new("http://backend", "서경 본관", "http://stats"),
            Tuning::default(),
        );
        assert_eq!(config.display_image(), "seokyeong.png");
    }
}
