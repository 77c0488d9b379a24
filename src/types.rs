use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Heterogeneous strategy parameters, ordered so serialization is stable.
pub type Parameters = BTreeMap<String, serde_json::Value>;

pub type CandidateId = Uuid;

/// Fitness assigned to candidates whose backtest failed to execute.
pub const FAILED_FITNESS: f64 = -1.0;

/// Performance record attached to a candidate for reporting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub returns: f64,
    pub risk: f64,
    pub sharpe_like_ratio: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// One proposed strategy: code, parameters, fitness and lineage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub generation: usize,
    pub parent_ids: Vec<CandidateId>,
    pub code: String,
    pub description: String,
    pub parameters: Parameters,
    /// `None` until the evaluator has scored this code+parameters signature.
    pub fitness: Option<f64>,
    pub performance: Option<PerformanceMetrics>,
    pub validation: Option<ValidationSummary>,
}

impl Candidate {
    pub fn new(
        generation: usize,
        code: impl Into<String>,
        description: impl Into<String>,
        parameters: Parameters,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation,
            parent_ids: Vec::new(),
            code: code.into(),
            description: description.into(),
            parameters,
            fitness: None,
            performance: None,
            validation: None,
        }
    }

    pub fn with_parents(mut self, parents: &[CandidateId]) -> Self {
        self.parent_ids = parents.to_vec();
        self
    }

    /// Fitness used for ranking; unscored candidates rank as zero.
    pub fn score(&self) -> f64 {
        self.fitness.unwrap_or(0.0)
    }

    pub fn is_scored(&self) -> bool {
        self.fitness.is_some()
    }

    /// Content hash of code and parameters, the evaluation cache key.
    pub fn signature(&self) -> String {
        let params = serde_json::to_string(&self.parameters).unwrap_or_default();
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.code.as_bytes());
        hasher.update(&[0]);
        hasher.update(params.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(|v| v.as_f64())
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }
}

/// Critic-assigned importance. Ordering is fixed: critical > high > medium > low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn weight(self) -> f64 {
        match self {
            Severity::Critical => 2.0,
            Severity::High => 1.5,
            Severity::Medium => 1.0,
            Severity::Low => 0.5,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticFeedback {
    pub critic: String,
    pub is_valid: bool,
    pub score: f64,
    pub severity: Severity,
    pub feedback: String,
    pub suggestions: Vec<String>,
}

impl CriticFeedback {
    pub fn is_blocking(&self) -> bool {
        !self.is_valid && self.severity == Severity::Critical
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    pub score: f64,
    pub feedback: Vec<CriticFeedback>,
    pub candidate: Candidate,
    pub iterations: usize,
    pub converged: bool,
}

/// Price history for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSeries {
    pub symbol: String,
    pub prices: Vec<f64>,
    #[serde(default)]
    pub volumes: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContext {
    pub assets: Vec<AssetSeries>,
    #[serde(default)]
    pub headlines: Vec<String>,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
}

fn default_timeframe() -> String {
    "1d".to_string()
}

impl MarketContext {
    pub fn symbols(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.symbol.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMetrics {
    pub target_return: f64,
    pub max_risk: f64,
}

impl Default for TargetMetrics {
    fn default() -> Self {
        Self {
            target_return: 0.1,
            max_risk: 0.2,
        }
    }
}

/// Result of running a candidate against market context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestOutcome {
    pub expected_return: f64,
    pub risk_assessment: f64,
    pub confidence_interval: (f64, f64),
    pub iterations: usize,
    #[serde(default)]
    pub equity_curve: Vec<f64>,
}
