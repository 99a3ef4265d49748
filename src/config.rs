//! Configuration types for the conversion client.
//!
//! Everything that controls *how* we talk to the remote API lives in
//! [`ClientConfig`], built via its [`ClientConfigBuilder`]. What is being
//! converted (file, key, options) lives in [`crate::request::ConversionRequest`]
//! instead, so one client can serve many requests.

use crate::error::ApiError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Default endpoint of the Datalab marker API.
pub const DEFAULT_API_URL: &str = "https://www.datalab.to/api/v1/marker";

/// Name of the authentication header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Configuration for a [`crate::client::MarkerClient`].
///
/// # Example
/// ```rust
/// use edgequake_marker::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .poll_interval(Duration::from_secs(1))
///     .max_polls(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_polls, 60);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Submission endpoint. Default: [`DEFAULT_API_URL`].
    pub api_url: String,

    /// Delay before each status check. Default: 2 s.
    pub poll_interval: Duration,

    /// Maximum number of status checks before giving up. Default: 300.
    ///
    /// With the default interval this bounds a conversion at roughly ten
    /// minutes.
    pub max_polls: u32,

    /// Timeout applied to every individual HTTP request, in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Optional observer for submit/poll events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            max_polls: 300,
            request_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PollProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Upper bound on the time spent polling, ignoring request latency.
    pub fn max_poll_duration(&self) -> Duration {
        self.poll_interval * self.max_polls
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.config.max_polls = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ApiError> {
        let c = &self.config;
        if !c.api_url.starts_with("http://") && !c.api_url.starts_with("https://") {
            return Err(ApiError::InvalidConfig(format!(
                "API URL must be http(s), got '{}'",
                c.api_url
            )));
        }
        if c.max_polls == 0 {
            return Err(ApiError::InvalidConfig("max_polls must be ≥ 1".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(ApiError::InvalidConfig(
                "request timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_polling_budget() {
        let c = ClientConfig::default();
        assert_eq!(c.api_url, DEFAULT_API_URL);
        assert_eq!(c.poll_interval, Duration::from_secs(2));
        assert_eq!(c.max_polls, 300);
        assert_eq!(c.max_poll_duration(), Duration::from_secs(600));
    }

    #[test]
    fn builder_rejects_zero_polls() {
        let err = ClientConfig::builder().max_polls(0).build().unwrap_err();
        assert!(err.to_string().contains("max_polls"));
    }

    #[test]
    fn builder_rejects_non_http_url() {
        let err = ClientConfig::builder()
            .api_url("ftp://example.com/marker")
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfig(_)));
    }

    #[test]
    fn builder_sets_fields() {
        let c = ClientConfig::builder()
            .api_url("http://127.0.0.1:9000/marker")
            .poll_interval(Duration::from_millis(5))
            .max_polls(7)
            .request_timeout_secs(3)
            .build()
            .unwrap();
        assert_eq!(c.api_url, "http://127.0.0.1:9000/marker");
        assert_eq!(c.poll_interval, Duration::from_millis(5));
        assert_eq!(c.max_polls, 7);
        assert_eq!(c.request_timeout_secs, 3);
    }

    #[test]
    fn debug_hides_callback() {
        let c = ClientConfig::default();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("max_polls: 300"));
    }
}
