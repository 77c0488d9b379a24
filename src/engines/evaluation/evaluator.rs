use super::backtest::Backtest;
use super::cache::EvaluationCache;
use super::fitness::fitness_score;
use crate::engines::metrics::MetricsEngine;
use crate::types::{
    BacktestOutcome, Candidate, MarketContext, PerformanceMetrics, TargetMetrics, FAILED_FITNESS,
};
use anyhow::{anyhow, Result};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Scores candidates through a backtest collaborator, memoised by the
/// candidate's code+parameters signature.
pub struct CandidateEvaluator {
    backtest: Arc<dyn Backtest>,
    timeout: Duration,
    fitness: EvaluationCache<f64>,
    performance: EvaluationCache<PerformanceMetrics>,
}

impl CandidateEvaluator {
    pub fn new(backtest: Arc<dyn Backtest>, timeout: Duration) -> Self {
        Self {
            backtest,
            timeout,
            fitness: EvaluationCache::new(DEFAULT_CACHE_CAPACITY),
            performance: EvaluationCache::new(DEFAULT_CACHE_CAPACITY),
        }
    }

    async fn run_backtest(&self, candidate: &Candidate, context: &MarketContext) -> Result<BacktestOutcome> {
        tokio::time::timeout(self.timeout, self.backtest.run(candidate, context))
            .await
            .map_err(|_| anyhow!("backtest timed out after {:?}", self.timeout))?
    }

    /// Fitness for `candidate`, or [`FAILED_FITNESS`] when the backtest fails.
    /// Failures are not cached.
    pub async fn evaluate(
        &self,
        candidate: &Candidate,
        context: &MarketContext,
        targets: &TargetMetrics,
    ) -> f64 {
        let key = candidate.signature();
        let result = self
            .fitness
            .get_or_try_compute(&key, || async {
                let outcome = self.run_backtest(candidate, context).await?;
                let fitness = fitness_score(&outcome, targets);
                debug!("Candidate {} scored {:.4}", candidate.id, fitness);
                Ok::<f64, anyhow::Error>(fitness)
            })
            .await;

        match result {
            Ok(fitness) => fitness,
            Err(e) => {
                warn!("Evaluation of candidate {} failed: {}", candidate.id, e);
                FAILED_FITNESS
            }
        }
    }

    /// Reporting metrics; cached separately from fitness.
    pub async fn calculate_performance_metrics(
        &self,
        candidate: &Candidate,
        context: &MarketContext,
    ) -> Result<PerformanceMetrics> {
        let key = candidate.signature();
        self.performance
            .get_or_try_compute(&key, || async {
                let outcome = self.run_backtest(candidate, context).await?;
                Ok::<_, anyhow::Error>(MetricsEngine::performance(&outcome))
            })
            .await
    }

    pub fn cached_fitness(&self, candidate: &Candidate) -> Option<f64> {
        self.fitness.get(&candidate.signature())
    }

    pub fn cache_len(&self) -> usize {
        self.fitness.len()
    }
}
