use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ThoughtChainError};

/// thought-chain service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtChainSettings {
    pub storage: StorageSettings,
    pub cache: CacheSettings,
    pub engine: EngineSettings,
}

/// Storage configuration for the thought record store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding one JSON document per thought
    pub root_path: PathBuf,
}

/// Listing cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Freshness window for cached listings, in seconds
    pub freshness_secs: u64,
}

impl CacheSettings {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}

/// Reasoning engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Model identifier handed to the engine on trigger
    pub default_model: String,
}

impl Default for ThoughtChainSettings {
    fn default() -> Self {
        Self {
            storage: StorageSettings {
                root_path: PathBuf::from("./thoughts"),
            },
            cache: CacheSettings { freshness_secs: 5 },
            engine: EngineSettings {
                default_model: "gpt-4".to_string(),
            },
        }
    }
}

impl ThoughtChainSettings {
    /// Load configuration from defaults, an optional TOML file, and
    /// THOUGHT_CHAIN__-prefixed environment variables
    pub fn load() -> Result<Self> {
        let default_root = if let Ok(data_dir) = std::env::var("THOUGHT_DATA_DIR") {
            tracing::info!("Using THOUGHT_DATA_DIR: {}", data_dir);
            data_dir
        } else {
            "./thoughts".to_string()
        };

        let mut builder = Config::builder()
            .set_default("storage.root_path", default_root)?
            .set_default("cache.freshness_secs", 5_i64)?
            .set_default("engine.default_model", "gpt-4")?;

        if let Ok(config_file) = std::env::var("THOUGHT_CHAIN_CONFIG") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(File::with_name("thought-chain.toml").required(false));
        }

        builder = builder.add_source(Environment::with_prefix("THOUGHT_CHAIN").separator("__"));

        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Validate configuration before constructing the store
    pub fn validate(&self) -> Result<()> {
        if self.storage.root_path.as_os_str().is_empty() {
            return Err(ThoughtChainError::validation(
                "storage.root_path",
                "must not be empty",
            ));
        }
        if self.storage.root_path.exists() && !self.storage.root_path.is_dir() {
            return Err(ThoughtChainError::validation(
                "storage.root_path",
                format!("not a directory: {}", self.storage.root_path.display()),
            ));
        }
        if self.engine.default_model.trim().is_empty() {
            return Err(ThoughtChainError::validation(
                "engine.default_model",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = ThoughtChainSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.cache.freshness(), Duration::from_secs(5));
    }

    #[test]
    fn empty_model_is_rejected() {
        let mut settings = ThoughtChainSettings::default();
        settings.engine.default_model = " ".to_string();
        assert!(settings.validate().is_err());
    }
}
