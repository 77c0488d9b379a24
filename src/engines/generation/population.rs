use crate::engines::metrics::RiskMetrics;
use crate::types::Candidate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub generation: usize,
    pub size: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub diversity: f64,
}

/// The fixed-size set of candidates alive in one generation
#[derive(Debug, Clone)]
pub struct Population {
    candidates: Vec<Candidate>,
    generation: usize,
}

impl Population {
    pub fn new(candidates: Vec<Candidate>, generation: usize) -> Self {
        Self {
            candidates,
            generation,
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.candidates
            .iter()
            .max_by(|a, b| a.score().partial_cmp(&b.score()).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn best_fitness(&self) -> f64 {
        self.best().map(Candidate::score).unwrap_or(0.0)
    }

    pub fn mean_fitness(&self) -> f64 {
        RiskMetrics::mean(&self.fitness_values())
    }

    /// `stddev(fitness) / max(best, 1)`
    pub fn diversity(&self) -> f64 {
        RiskMetrics::std_dev(&self.fitness_values()) / self.best_fitness().max(1.0)
    }

    fn fitness_values(&self) -> Vec<f64> {
        self.candidates.iter().map(Candidate::score).collect()
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            generation: self.generation,
            size: self.len(),
            best_fitness: self.best_fitness(),
            mean_fitness: self.mean_fitness(),
            diversity: self.diversity(),
        }
    }
}
