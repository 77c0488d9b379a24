use crate::config::{ConfigSection, EvolutionConfig};
use crate::engines::evaluation::CandidateEvaluator;
use crate::engines::generation::{
    lineage::Lineage,
    operators::{offspring, replacement, select_parents},
    population::{GenerationStats, Population},
    seeds::seed_population,
};
use crate::error::{ForgeError, Result};
use crate::oracle::{prompts, OracleClient, OracleRequestKind};
use crate::types::{Candidate, MarketContext, TargetMetrics};
use futures::future::{join, join_all};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, stats: &GenerationStats);
    fn on_candidates_evaluated(&mut self, evaluated: usize, total: usize);
}

/// Evolves a fixed-size population of candidates, using the evaluator for
/// fitness and the oracle for crossover and mutation.
pub struct PopulationEngine {
    config: EvolutionConfig,
    evaluator: Arc<CandidateEvaluator>,
    oracle: OracleClient,
    population: Population,
    lineage: Lineage,
    history: Vec<GenerationStats>,
    rng: StdRng,
}

impl PopulationEngine {
    /// Seed from the built-in strategy templates.
    pub fn new(
        config: EvolutionConfig,
        evaluator: Arc<CandidateEvaluator>,
        oracle: OracleClient,
    ) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seeds = seed_population(config.population_size, &mut rng);
        Self::build(config, evaluator, oracle, seeds, rng)
    }

    /// Seed from caller-supplied candidates; there must be exactly
    /// `population_size` of them.
    pub fn with_seeds(
        config: EvolutionConfig,
        evaluator: Arc<CandidateEvaluator>,
        oracle: OracleClient,
        seeds: Vec<Candidate>,
    ) -> Result<Self> {
        if seeds.len() != config.population_size {
            return Err(ForgeError::InvalidInput(format!(
                "expected {} seed candidates, got {}",
                config.population_size,
                seeds.len()
            )));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::build(config, evaluator, oracle, seeds, rng)
    }

    fn build(
        config: EvolutionConfig,
        evaluator: Arc<CandidateEvaluator>,
        oracle: OracleClient,
        seeds: Vec<Candidate>,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        if config.elite_count() == 0 {
            return Err(ForgeError::Configuration(format!(
                "elite ratio {} keeps no elites in a population of {}",
                config.elite_ratio, config.population_size
            )));
        }

        let mut lineage = Lineage::new();
        for seed in &seeds {
            lineage.record(seed);
        }

        Ok(Self {
            config,
            evaluator,
            oracle,
            population: Population::new(seeds, 0),
            lineage,
            history: Vec::new(),
            rng,
        })
    }

    /// Run up to `max_generations` rounds and return the fittest candidate.
    ///
    /// Cancellation is honoured between generations only; the best candidate
    /// found so far is returned.
    pub async fn evolve<C: ProgressCallback>(
        &mut self,
        context: &MarketContext,
        targets: &TargetMetrics,
        cancel: &CancellationToken,
        callback: &mut C,
    ) -> Result<Candidate> {
        for round in 0..self.config.max_generations {
            if cancel.is_cancelled() {
                info!("Evolution cancelled before generation {}", round + 1);
                break;
            }
            callback.on_generation_start(round);

            let current = self.population.candidates().to_vec();
            let scored = self.score(current, context, targets, callback).await;
            for candidate in &scored {
                self.lineage.record(candidate);
            }
            self.population = Population::new(scored, self.population.generation());

            let parents = select_parents(
                self.population.candidates(),
                self.config.elite_count(),
                self.config.tournament_size,
                self.config.population_size,
                &mut self.rng,
            );

            let children = self.breed(&parents, context, round + 1).await;
            let children = self.score(children, context, targets, callback).await;
            for child in &children {
                self.lineage.record(child);
            }

            let next = replacement(parents, children, self.config.population_size);
            self.population = Population::new(next, round + 1);

            let stats = self.population.stats();
            callback.on_generation_complete(&stats);
            self.history.push(stats.clone());

            if stats.diversity < self.config.diversity_threshold {
                info!(
                    "Population converged at generation {} (diversity {:.4} < {:.4})",
                    stats.generation, stats.diversity, self.config.diversity_threshold
                );
                break;
            }
        }

        let live: Vec<_> = self.population.candidates().iter().map(|c| c.id).collect();
        self.lineage.retain_reachable(&live);

        self.population
            .best()
            .cloned()
            .ok_or_else(|| ForgeError::Evaluation("population is empty".to_string()))
    }

    /// Score every candidate that has no fitness yet, concurrently.
    async fn score<C: ProgressCallback>(
        &self,
        candidates: Vec<Candidate>,
        context: &MarketContext,
        targets: &TargetMetrics,
        callback: &mut C,
    ) -> Vec<Candidate> {
        let total = candidates.len();
        let pending = candidates.iter().filter(|c| !c.is_scored()).count();

        let evaluator = &self.evaluator;
        let scored = join_all(candidates.into_iter().map(|mut candidate| async move {
            if !candidate.is_scored() {
                candidate.fitness = Some(evaluator.evaluate(&candidate, context, targets).await);
            }
            candidate
        }))
        .await;

        if pending > 0 {
            callback.on_candidates_evaluated(pending, total);
        }
        scored
    }

    /// Consecutive parent pairs each yield a crossover child and a mutation
    /// child of the first parent. An unpaired last parent yields a mutation.
    async fn breed(
        &self,
        parents: &[Candidate],
        context: &MarketContext,
        generation: usize,
    ) -> Vec<Candidate> {
        let oracle = &self.oracle;
        let broods = join_all(parents.chunks(2).map(|pair| async move {
            match pair {
                [a, b] => {
                    let (crossed, mutated) = join(
                        oracle.suggest(
                            OracleRequestKind::Crossover,
                            prompts::crossover_prompt(a, b, context),
                        ),
                        oracle.suggest(
                            OracleRequestKind::Mutation,
                            prompts::mutation_prompt(a, context),
                        ),
                    )
                    .await;
                    vec![
                        offspring(crossed.into_suggestion(), generation, &[a.id, b.id]),
                        offspring(mutated.into_suggestion(), generation, &[a.id]),
                    ]
                }
                [a] => {
                    let mutated = oracle
                        .suggest(OracleRequestKind::Mutation, prompts::mutation_prompt(a, context))
                        .await;
                    vec![offspring(mutated.into_suggestion(), generation, &[a.id])]
                }
                _ => Vec::new(),
            }
        }))
        .await;

        broods.into_iter().flatten().collect()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }
}
