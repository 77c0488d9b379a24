use super::evolution_engine::ProgressCallback;
use super::population::GenerationStats;
use log::{debug, info};
use std::sync::mpsc::Sender;

/// Reports progress through the `log` facade
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        info!("Generation {} starting...", generation + 1);
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        info!(
            "Generation {} complete. Best fitness: {:.4}, mean: {:.4}, diversity: {:.4}",
            stats.generation, stats.best_fitness, stats.mean_fitness, stats.diversity
        );
    }

    fn on_candidates_evaluated(&mut self, evaluated: usize, total: usize) {
        debug!("  Evaluated {}/{} candidates", evaluated, total);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete(GenerationStats),
    CandidatesEvaluated { evaluated: usize, total: usize },
}

/// Forwards progress over a channel to another thread or task
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete(stats.clone()));
    }

    fn on_candidates_evaluated(&mut self, evaluated: usize, total: usize) {
        let _ = self.sender.send(ProgressMessage::CandidatesEvaluated { evaluated, total });
    }
}
