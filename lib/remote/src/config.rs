//! Collaborator configuration.
//!
//! Loaded via the `config` crate from environment variables prefixed with
//! `FLOWDECK`, using `__` to separate nesting levels:
//!
//! ```text
//! FLOWDECK__EXECUTION__BASE_URL=http://runner:8000
//! FLOWDECK__CATALOG__TIMEOUT_SECS=5
//! FLOWDECK__STORE__DIRECTORY=/var/lib/flowdeck/workflows
//! FLOWDECK__LAYOUT__DIRECTION=LR
//! ```
//!
//! Every field has a default, so an empty environment is valid.

use flowdeck_workflow::{LayoutDirection, LayoutOptions};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for every collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteConfig {
    /// Workflow execution service.
    #[serde(default)]
    pub execution: ServiceConfig,

    /// Agent catalog service.
    #[serde(default)]
    pub catalog: ServiceConfig,

    /// Workflow file store.
    #[serde(default)]
    pub store: StoreConfig,

    /// Auto-layout defaults.
    #[serde(default)]
    pub layout: LayoutSettings,
}

/// An HTTP service endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL; request paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServiceConfig {
    /// Creates an endpoint with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Joins `path` onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(default_base_url())
    }
}

/// Where workflow documents live on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_directory")]
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_store_directory(),
        }
    }
}

/// Layout defaults applied by hosts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutSettings {
    #[serde(default)]
    pub direction: LayoutDirection,
}

impl LayoutSettings {
    /// Layout options using the configured direction.
    #[must_use]
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions::default().with_direction(self.direction)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_store_directory() -> PathBuf {
    PathBuf::from("./workflows")
}

impl RemoteConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(None)
    }

    /// Loads configuration from an explicit set of variables instead of the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed.
    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self, config::ConfigError> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<config::Map<String, String>>) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("FLOWDECK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = RemoteConfig::from_vars(config::Map::new()).expect("defaults");

        assert_eq!(config.execution.base_url, "http://localhost:8000");
        assert_eq!(config.catalog.base_url, "http://localhost:8000");
        assert_eq!(config.execution.timeout(), Duration::from_secs(30));
        assert_eq!(config.store.directory, PathBuf::from("./workflows"));
        assert_eq!(config.layout.direction, LayoutDirection::TopToBottom);
    }

    #[test]
    fn nested_variables_override_defaults() {
        let config = RemoteConfig::from_vars(vars(&[
            ("FLOWDECK__EXECUTION__BASE_URL", "http://runner:9000"),
            ("FLOWDECK__EXECUTION__TIMEOUT_SECS", "5"),
            ("FLOWDECK__STORE__DIRECTORY", "/tmp/canvases"),
            ("FLOWDECK__LAYOUT__DIRECTION", "LR"),
        ]))
        .expect("parse");

        assert_eq!(config.execution.base_url, "http://runner:9000");
        assert_eq!(config.execution.timeout_secs, 5);
        assert_eq!(config.catalog.base_url, "http://localhost:8000");
        assert_eq!(config.store.directory, PathBuf::from("/tmp/canvases"));
        assert_eq!(
            config.layout.options().direction,
            LayoutDirection::LeftToRight
        );
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let service = ServiceConfig::new("http://localhost:8000/");
        assert_eq!(service.url("/execute"), "http://localhost:8000/execute");
        assert_eq!(service.url("agents"), "http://localhost:8000/agents");
    }
}
