//! End-to-end analysis of a market context: preprocessing, candidate
//! evolution and verification, forward tree search and oracle synthesis.

pub mod orchestrator;
pub mod preprocess;
pub mod report;
pub mod synthesis;
pub mod tree_search;

pub use orchestrator::{AnalysisOrchestrator, AnalysisRequest};
pub use preprocess::{preprocess, MarketRegime, MarketSnapshot, RiskProfile};
pub use report::{build_recommendations, confidence_score, AnalysisReport, Recommendations};
pub use synthesis::MarketAnalysis;
pub use tree_search::{
    CandidatePolicy, HeuristicTreeSearch, SearchState, TreeSearchEvaluator, TreeSearchOutcome,
    TreeSearchRequest,
};
