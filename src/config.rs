use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DelayError, Result};

/// Application configuration loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of actix workers; 0 keeps the actix default (one per core)
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub data_path: PathBuf,
    pub learning_rate: f32,
    pub iterations: usize,
    pub max_depth: u32,
    pub min_leaf_size: usize,
    pub test_size: f64,
    pub seed: u64,
    /// Probability above which a flight is labelled delayed
    pub threshold: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: 0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: PathBuf::from("models/delay_model.json"),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            data_path: PathBuf::from("data/data.csv"),
            learning_rate: 0.01,
            iterations: 100,
            max_depth: 6,
            min_leaf_size: 1,
            test_size: 0.33,
            seed: 42,
            threshold: 0.5,
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DelayError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DelayError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("loading config from {}", path.display());
            Self::load(path)
        } else {
            warn!("config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Apply `PORT` and `MODEL_PATH` overrides from the environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(
            std::env::var("PORT").ok(),
            std::env::var("MODEL_PATH").ok(),
        )
    }

    fn with_overrides(mut self, port: Option<String>, model_path: Option<String>) -> Result<Self> {
        if let Some(port) = port {
            self.server.port = port
                .parse()
                .map_err(|_| DelayError::Config(format!("Invalid PORT value: {}", port)))?;
        }
        if let Some(model_path) = model_path {
            self.model.path = PathBuf::from(model_path);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.training;
        if !(t.test_size > 0.0 && t.test_size < 1.0) {
            return Err(DelayError::Config(format!(
                "training.test_size must be in (0, 1), got {}",
                t.test_size
            )));
        }
        if !(t.threshold > 0.0 && t.threshold < 1.0) {
            return Err(DelayError::Config(format!(
                "training.threshold must be in (0, 1), got {}",
                t.threshold
            )));
        }
        if t.iterations == 0 {
            return Err(DelayError::Config("training.iterations must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.model.path, PathBuf::from("models/delay_model.json"));
        assert_eq!(config.training.seed, 42);
        assert!((config.training.test_size - 0.33).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9000

            [training]
            learning_rate = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.training.learning_rate, 0.1);
        assert_eq!(config.training.iterations, 100);
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml("[server\nport = 1").unwrap_err();
        assert!(matches!(err, DelayError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default()
            .with_overrides(Some("9100".to_string()), Some("/tmp/m.json".to_string()))
            .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.model.path, PathBuf::from("/tmp/m.json"));

        let err = AppConfig::default()
            .with_overrides(Some("not-a-port".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, DelayError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_split() {
        let mut config = AppConfig::default();
        config.training.test_size = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
