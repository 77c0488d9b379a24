use super::{
    analysis::AnalysisConfig,
    evolution::EvolutionConfig,
    oracle::OracleConfig,
    traits::ConfigSection,
    verification::VerificationConfig,
};
use crate::error::ForgeError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `ALGOFORGE__EVOLUTION__POPULATION_SIZE=20`
pub const ENV_PREFIX: &str = "ALGOFORGE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub verification: VerificationConfig,
    pub oracle: OracleConfig,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ForgeError> {
        self.evolution.validate()?;
        self.verification.validate()?;
        self.oracle.validate()?;
        self.analysis.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a TOML or JSON file, then apply `ALGOFORGE__*` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ForgeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ForgeError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
            .map_err(|e| ForgeError::Configuration(format!("Failed to parse config: {}", e)))?;

        self.replace(config)
    }

    /// Apply environment overrides on top of the defaults.
    pub fn load_from_env(&self) -> Result<(), ForgeError> {
        let config: AppConfig = config::Config::builder()
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
            .map_err(|e| ForgeError::Configuration(format!("Failed to parse config: {}", e)))?;

        self.replace(config)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn replace(&self, config: AppConfig) -> Result<(), ForgeError> {
        config.validate()?;
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ForgeError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| ForgeError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| ForgeError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Apply an edit; the previous config is kept if the result fails validation.
    pub fn update<F>(&self, f: F) -> Result<(), ForgeError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        self.replace(candidate)
    }
}
