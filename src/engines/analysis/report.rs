use super::preprocess::MarketRegime;
use super::synthesis::MarketAnalysis;
use super::tree_search::TreeSearchOutcome;
use crate::engines::generation::GenerationStats;
use crate::types::{CriticFeedback, PerformanceMetrics, VerificationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub action_items: Vec<String>,
    pub risk_warnings: Vec<String>,
    pub optimization_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub generated_at: String,
    pub regime: MarketRegime,
    pub sentiment: f64,
    /// Verified candidate is `verification.candidate`
    pub verification: VerificationResult,
    pub performance: Option<PerformanceMetrics>,
    pub tree_search: TreeSearchOutcome,
    pub analysis: MarketAnalysis,
    pub analysis_fallback: bool,
    pub confidence_score: f64,
    pub recommendations: Recommendations,
    pub generations: Vec<GenerationStats>,
}

/// `min(1, 0.6·verification + 0.4·(1 − risk) + 0.1 if converged)`
pub fn confidence_score(verification_score: f64, risk_assessment: f64, converged: bool) -> f64 {
    let bonus = if converged { 0.1 } else { 0.0 };
    (0.6 * verification_score + 0.4 * (1.0 - risk_assessment) + bonus).min(1.0)
}

fn dedup(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| !s.trim().is_empty() && seen.insert(s.clone()))
        .collect()
}

pub fn build_recommendations(
    feedback: &[CriticFeedback],
    tree_search: &TreeSearchOutcome,
    analysis: &MarketAnalysis,
    high_risk_threshold: f64,
) -> Recommendations {
    let action_items = dedup(
        feedback
            .iter()
            .filter(|f| !f.is_valid)
            .flat_map(|f| f.suggestions.iter().cloned()),
    );

    let mut warnings = Vec::new();
    if tree_search.risk_assessment > high_risk_threshold {
        warnings.push(format!(
            "High forward-looking risk: {:.2} exceeds threshold {:.2}",
            tree_search.risk_assessment, high_risk_threshold
        ));
    }
    warnings.extend(analysis.risk_factors.iter().cloned());

    Recommendations {
        action_items,
        risk_warnings: dedup(warnings),
        optimization_suggestions: dedup(analysis.recommendations.iter().cloned()),
    }
}
