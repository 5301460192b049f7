//! Service configuration

use anyhow::{Context, Result};
use calculator_lib::SizingConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration, read from `CALC_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Port for the calculation, health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Optional calibration override (TOML, JSON or YAML)
    #[serde(default)]
    pub calibration_file: Option<PathBuf>,
}

fn default_api_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            calibration_file: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("CALC").try_parsing(true))
            .build()
            .context("Failed to read CALC_* environment")?;

        config
            .try_deserialize()
            .context("Invalid service configuration")
    }

    /// Built-in calibration, or the override file merged over it
    pub fn load_calibration(&self) -> Result<SizingConfig> {
        let Some(path) = &self.calibration_file else {
            return Ok(SizingConfig::default());
        };

        let sizing: SizingConfig = config::Config::builder()
            .add_source(config::File::from(path.as_path()))
            .build()
            .with_context(|| format!("Failed to read calibration file {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse calibration file {}", path.display()))?;
        sizing.validate()?;

        Ok(sizing)
    }

    /// Human-readable origin of the calibration
    pub fn calibration_source(&self) -> String {
        self.calibration_file
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_calibration() {
        let config = ApiConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.load_calibration().unwrap(), SizingConfig::default());
        assert_eq!(config.calibration_source(), "built-in");
    }

    #[test]
    fn test_toml_calibration_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[router]\nmin_replicas = 3\n\n[querier]\nqps_per_replica = 10.0").unwrap();

        let config = ApiConfig {
            calibration_file: Some(file.path().to_path_buf()),
            ..ApiConfig::default()
        };
        let sizing = config.load_calibration().unwrap();
        assert_eq!(sizing.router.min_replicas, 3);
        assert_eq!(sizing.querier.qps_per_replica, 10.0);
        assert_eq!(sizing.store, SizingConfig::default().store);
    }

    #[test]
    fn test_invalid_calibration_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "limits": {{ "store": {{ "cpu": 0.5, "memory": 1.5 }} }} }}"#).unwrap();

        let config = ApiConfig {
            calibration_file: Some(file.path().to_path_buf()),
            ..ApiConfig::default()
        };
        assert!(config.load_calibration().is_err());
    }

    #[test]
    fn test_missing_calibration_file() {
        let config = ApiConfig {
            calibration_file: Some(PathBuf::from("/nonexistent/calibration.toml")),
            ..ApiConfig::default()
        };
        assert!(config.load_calibration().is_err());
    }
}
