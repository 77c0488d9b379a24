use super::traits::{ensure_unit_interval, ConfigSection};
use crate::error::ForgeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub elite_ratio: f64,
    pub tournament_size: usize,
    pub diversity_threshold: f64,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            max_generations: 5,
            elite_ratio: 0.2,
            tournament_size: 3,
            diversity_threshold: 0.01,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elite_ratio).floor() as usize
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), ForgeError> {
        if self.population_size < 2 {
            return Err(ForgeError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if self.max_generations == 0 {
            return Err(ForgeError::Configuration(
                "Max generations must be at least 1".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(ForgeError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        ensure_unit_interval("Elite ratio", self.elite_ratio)?;
        if self.diversity_threshold < 0.0 {
            return Err(ForgeError::Configuration(
                "Diversity threshold must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
