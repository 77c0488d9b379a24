pub mod backtest;
pub mod cache;
pub mod evaluator;
pub mod fitness;

pub use backtest::{Backtest, HeuristicBacktest};
pub use cache::EvaluationCache;
pub use evaluator::CandidateEvaluator;
pub use fitness::fitness_score;
