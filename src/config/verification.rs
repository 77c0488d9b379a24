use super::traits::{ensure_unit_interval, ConfigSection};
use crate::error::ForgeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub max_iterations: usize,
    pub convergence_threshold: f64,
    pub min_score: f64,
    pub require_all_critics: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            convergence_threshold: 0.85,
            min_score: 0.7,
            require_all_critics: false,
        }
    }
}

impl ConfigSection for VerificationConfig {
    fn section_name() -> &'static str {
        "verification"
    }

    fn validate(&self) -> Result<(), ForgeError> {
        if self.max_iterations == 0 {
            return Err(ForgeError::Configuration(
                "Max iterations must be at least 1".to_string(),
            ));
        }
        ensure_unit_interval("Convergence threshold", self.convergence_threshold)?;
        ensure_unit_interval("Minimum score", self.min_score)?;
        Ok(())
    }
}
