use super::traits::{ensure_unit_interval, ConfigSection};
use crate::error::ForgeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub use_evolution: bool,
    pub evaluation_timeout_secs: u64,
    pub tree_search_timeout_secs: u64,
    /// Tree-search risk above which a risk warning is emitted
    pub high_risk_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            use_evolution: true,
            evaluation_timeout_secs: 30,
            tree_search_timeout_secs: 60,
            high_risk_threshold: 0.7,
        }
    }
}

impl AnalysisConfig {
    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluation_timeout_secs)
    }

    pub fn tree_search_timeout(&self) -> Duration {
        Duration::from_secs(self.tree_search_timeout_secs)
    }
}

impl ConfigSection for AnalysisConfig {
    fn section_name() -> &'static str {
        "analysis"
    }

    fn validate(&self) -> Result<(), ForgeError> {
        if self.evaluation_timeout_secs == 0 || self.tree_search_timeout_secs == 0 {
            return Err(ForgeError::Configuration(
                "Timeouts must be at least one second".to_string(),
            ));
        }
        ensure_unit_interval("High risk threshold", self.high_risk_threshold)
    }
}
