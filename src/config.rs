//! Configuration file loading.
//!
//! ```toml
//! [capture]
//! width = 1280
//! height = 720
//!
//! [scheduler]
//! tick_period_ms = 5000
//! min_gap_ms = 3000
//!
//! [transport]
//! base_url = "http://localhost:8000"
//!
//! [metrics]
//! port = 9090
//! ```

use crate::capture::{CaptureConfig, CaptureConfigError};
use crate::scheduler::{SchedulerConfig, SchedulerConfigError};
use crate::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid capture settings: {0}")]
    /// Bad `[capture]` section.
    Capture(#[from] CaptureConfigError),
    #[error("invalid scheduler settings: {0}")]
    /// Bad `[scheduler]` section.
    Scheduler(#[from] SchedulerConfigError),
    #[error("invalid endpoint URL: {0}")]
    /// Service URL is not http(s).
    InvalidUrl(String),
    #[error("failed to read config file: {0}")]
    /// The file could not be read.
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    /// The file is not valid TOML for this format.
    ParseError(String),
}

/// Metrics exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { port: 9090 }
    }
}

impl MetricsConfig {
    /// Listen address on all interfaces, or `None` when disabled.
    pub fn bind_addr(&self) -> Option<SocketAddr> {
        (self.port != 0).then(|| ([0, 0, 0, 0], self.port).into())
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[capture]` section.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// `[scheduler]` section.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// `[transport]` section.
    #[serde(default)]
    pub transport: TransportConfig,
    /// `[metrics]` section.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.scheduler.validate()?;
        let url = &self.transport.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[scheduler]\ntick_period_ms = 1000\n\n[transport]\nbase_url = \"http://gate:8000\""
        )
        .unwrap();

        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.scheduler.tick_period_ms, 1000);
        assert_eq!(config.scheduler.min_gap_ms, 3000);
        assert_eq!(config.transport.base_url, "http://gate:8000");
        assert_eq!(config.transport.validate_path, "/api/validate");
        assert_eq!(config.capture.width, 1280);
    }

    #[test]
    fn test_bad_url_rejected() {
        let mut config = FileConfig::default();
        config.transport.base_url = "gate:8000".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_metrics_port_zero_disables_exporter() {
        let mut metrics = MetricsConfig::default();
        assert_eq!(metrics.bind_addr().map(|a| a.port()), Some(9090));
        metrics.port = 0;
        assert!(metrics.bind_addr().is_none());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FileConfig::from_file("/nonexistent/facegate.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
