//! Configuration management for cached endpoints.
//!
//! Settings are loaded from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Config file (explicit path, or `FRESHET_CONFIG`)
//! 3. Environment variables `FRESHET__<SECTION>__<KEY>` (highest priority)
//!

mod endpoint;
mod index;
pub use endpoint::*;
pub use index::*;


//---
use std::env;

use config::{Config, Environment, File};
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable naming the config file when no path is passed to
/// [`Settings::load`].
pub const CONFIG_PATH_ENV: &str = "FRESHET_CONFIG";

const ENV_PREFIX: &str = "FRESHET";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    /// Target resource and freshness policy
    pub endpoint: EndpointConfig,
    /// Collection shape used by the local index
    pub index: IndexConfig,
}

impl Settings {
    /// Load configuration with priority ordering
    ///
    /// # Arguments
    /// * `path` - Optional config file; falls back to `FRESHET_CONFIG`
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        // 1. Config file
        let path = path.map(str::to_owned).or_else(|| env::var(CONFIG_PATH_ENV).ok());
        if let Some(path) = path {
            config = config.add_source(File::with_name(&path).required(true));
        }

        // 2. Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint.validate()?;
        self.index.validate()?;
        Ok(())
    }
}
