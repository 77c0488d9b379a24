use crate::oracle::Suggestion;
use crate::types::{Candidate, CandidateId};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Sort descending by fitness; unscored candidates rank as zero.
pub fn sort_by_fitness(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
}

/// Top `elite_count` candidates by fitness
pub fn elite_selection(population: &[Candidate], elite_count: usize) -> Vec<Candidate> {
    let mut sorted = population.to_vec();
    sort_by_fitness(&mut sorted);
    sorted.truncate(elite_count);
    sorted
}

/// Tournament selection: pick best of K uniformly sampled candidates
pub fn tournament_selection<'a, R: Rng>(
    population: &'a [Candidate],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Candidate {
    let mut best = &population[rng.gen_range(0..population.len())];

    for _ in 1..tournament_size {
        let challenger = &population[rng.gen_range(0..population.len())];
        if challenger.score() > best.score() {
            best = challenger;
        }
    }

    best
}

/// Elites first, then tournament winners until the pool holds `pool_size`.
pub fn select_parents<R: Rng>(
    population: &[Candidate],
    elite_count: usize,
    tournament_size: usize,
    pool_size: usize,
    rng: &mut R,
) -> Vec<Candidate> {
    if population.is_empty() {
        return Vec::new();
    }

    let mut pool = elite_selection(population, elite_count.min(pool_size));
    while pool.len() < pool_size {
        pool.push(tournament_selection(population, tournament_size, rng).clone());
    }
    pool
}

/// Build an unscored offspring from an oracle proposal.
pub fn offspring(suggestion: Suggestion, generation: usize, parents: &[CandidateId]) -> Candidate {
    Candidate::new(
        generation,
        suggestion.code,
        suggestion.description,
        suggestion.parameters,
    )
    .with_parents(parents)
}

/// Merge parents and offspring (each id once), keep the fittest `size`.
pub fn replacement(parents: Vec<Candidate>, offspring: Vec<Candidate>, size: usize) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Candidate> = parents
        .into_iter()
        .chain(offspring)
        .filter(|c| seen.insert(c.id))
        .collect();
    sort_by_fitness(&mut merged);
    merged.truncate(size);
    merged
}
