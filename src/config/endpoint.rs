use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Per-endpoint freshness policy
///
/// `refresh_interval_ms` is the client-chosen refresh interval and is
/// independent of any `Expires` header the server sends.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EndpointConfig {
    /// Resource URL (may be supplied later through `reset`)
    #[serde(default)]
    pub url: Option<String>,

    /// Client-declared refresh interval in milliseconds (None to rely on `Expires` only)
    #[serde(default)]
    pub refresh_interval_ms: Option<u64>,

    /// Fetch even when the resource carries no freshness signal at all
    #[serde(default)]
    pub fetch_refreshes_without_interval: bool,

    /// Floor for re-arming the poll timer when a resource is due again right
    /// after a fetch
    #[serde(default = "default_min_poll_interval_ms")]
    pub min_poll_interval_ms: u64,

    /// Change stream channel capacity; lagging subscribers skip ahead
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,

    /// Request timeout for the bundled HTTP transport
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            refresh_interval_ms: None,
            fetch_refreshes_without_interval: false,
            min_poll_interval_ms: default_min_poll_interval_ms(),
            change_buffer: default_change_buffer(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl EndpointConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "endpoint url {url:?} must use http or https"
                ))));
            }
        }

        if self.refresh_interval_ms == Some(0) {
            return Err(Error::Config(ConfigError::Message(
                "refresh_interval_ms must be > 0 (omit it to disable)".to_string(),
            )));
        }

        if self.change_buffer == 0 {
            return Err(Error::Config(ConfigError::Message(
                "change_buffer must be > 0".to_string(),
            )));
        }

        if self.request_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "request_timeout_ms must be > 0".to_string(),
            )));
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_ms.map(Duration::from_millis)
    }

    pub fn min_poll_interval(&self) -> Duration {
        Duration::from_millis(self.min_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_min_poll_interval_ms() -> u64 {
    1000
}
fn default_change_buffer() -> usize {
    16
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
