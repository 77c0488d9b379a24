use crate::oracle::{prompts, OracleClient, OracleRequestKind};
use log::warn;
use serde::{Deserialize, Serialize};

/// Narrative analysis produced by the oracle. All three lists are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

impl MarketAnalysis {
    /// Used when the oracle reply is missing or unusable.
    pub fn generic() -> Self {
        Self {
            insights: vec!["Automated analysis unavailable; results are based on quantitative checks only".to_string()],
            recommendations: vec!["Review the candidate manually before deployment".to_string()],
            risk_factors: vec!["Qualitative market assessment was not performed".to_string()],
        }
    }
}

/// Returns the analysis and whether the generic fallback was used.
pub async fn synthesize(oracle: &OracleClient, summary: &str) -> (MarketAnalysis, bool) {
    match oracle
        .request_json::<MarketAnalysis>(OracleRequestKind::Analysis, prompts::analysis_prompt(summary))
        .await
    {
        Ok(analysis) => (analysis, false),
        Err(reason) => {
            warn!("Analysis synthesis fell back: {}", reason);
            (MarketAnalysis::generic(), true)
        }
    }
}
