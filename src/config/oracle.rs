use super::traits::ConfigSection;
use crate::error::ForgeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            temperature: 0.7,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConfigSection for OracleConfig {
    fn section_name() -> &'static str {
        "oracle"
    }

    fn validate(&self) -> Result<(), ForgeError> {
        if self.endpoint.trim().is_empty() {
            return Err(ForgeError::Configuration(
                "Oracle endpoint must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ForgeError::Configuration(
                "Oracle timeout must be at least one second".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ForgeError::Configuration(
                "Oracle temperature must be between 0 and 2".to_string(),
            ));
        }
        Ok(())
    }
}
