use super::preprocess::{MarketRegime, MarketSnapshot};
use crate::types::{Candidate, TargetMetrics};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_STEP: f64 = 0.05;
const DEFAULT_MAX_POSITION: f64 = 0.25;
const DEFAULT_RISK_AVERSION: f64 = 1.0;
/// Annualisation factor applied to per-period statistics
const PERIODS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketConditions {
    pub regime: MarketRegime,
    pub sentiment: f64,
}

/// Portfolio position the search starts from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    /// Symbol to portfolio weight
    pub assets: BTreeMap<String, f64>,
    pub timeframe: String,
    /// Symbol to annualised volatility
    pub risks: BTreeMap<String, f64>,
    pub market_conditions: MarketConditions,
    pub target_metrics: TargetMetrics,
}

impl SearchState {
    /// Equal weights across the snapshot's symbols.
    pub fn from_snapshot(snapshot: &MarketSnapshot, timeframe: &str, targets: TargetMetrics) -> Self {
        let n = snapshot.symbols.len().max(1) as f64;
        let assets = snapshot.symbols.iter().map(|s| (s.clone(), 1.0 / n)).collect();
        let risks = snapshot
            .risk
            .iter()
            .map(|(s, r)| (s.clone(), r.volatility * PERIODS_PER_YEAR.sqrt()))
            .collect();
        Self {
            assets,
            timeframe: timeframe.to_string(),
            risks,
            market_conditions: MarketConditions {
                regime: snapshot.regime,
                sentiment: snapshot.sentiment,
            },
            target_metrics: targets,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.assets.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceAction {
    pub symbol: String,
    pub delta: f64,
}

/// Action proposal and reward derived from the candidate's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePolicy {
    pub step: f64,
    pub max_position: f64,
    pub risk_aversion: f64,
}

impl Default for CandidatePolicy {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            max_position: DEFAULT_MAX_POSITION,
            risk_aversion: DEFAULT_RISK_AVERSION,
        }
    }
}

impl CandidatePolicy {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        let defaults = Self::default();
        let max_position = candidate
            .param_f64("maxPosition")
            .filter(|v| *v > 0.0)
            .map(|v| v.min(1.0))
            .unwrap_or(defaults.max_position);
        let conservative = candidate
            .parameters
            .get("conservativeMode")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Self {
            step: defaults.step,
            max_position,
            risk_aversion: if conservative { 2.0 } else { defaults.risk_aversion },
        }
    }

    /// Single-step weight changes that keep every weight in
    /// `[0, max(max_position, current)]` and the total at or below 1.
    pub fn propose_actions(&self, state: &SearchState) -> Vec<RebalanceAction> {
        let total = state.total_weight();
        let mut actions = Vec::new();
        for (symbol, weight) in &state.assets {
            let cap = self.max_position.max(*weight);
            if weight + self.step <= cap + f64::EPSILON && total + self.step <= 1.0 + f64::EPSILON {
                actions.push(RebalanceAction { symbol: symbol.clone(), delta: self.step });
            }
            if *weight - self.step >= -f64::EPSILON {
                actions.push(RebalanceAction { symbol: symbol.clone(), delta: -self.step });
            }
        }
        actions
    }

    pub fn reward(&self, expected_return: f64, risk: f64) -> f64 {
        expected_return - self.risk_aversion * risk
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSearchRequest {
    pub initial_state: SearchState,
    pub policy: CandidatePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSearchOutcome {
    pub expected_return: f64,
    /// In [0, 1]
    pub risk_assessment: f64,
    pub confidence_interval: (f64, f64),
    pub iterations: usize,
}

/// Forward-looking portfolio search collaborator
#[async_trait]
pub trait TreeSearchEvaluator: Send + Sync {
    async fn search(&self, request: &TreeSearchRequest) -> Result<TreeSearchOutcome>;
}

/// Greedy search over the policy's rebalance actions with a regime-driven
/// return model.
pub struct HeuristicTreeSearch {
    max_iterations: usize,
}

impl Default for HeuristicTreeSearch {
    fn default() -> Self {
        Self::new(50)
    }
}

impl HeuristicTreeSearch {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    fn drift(conditions: &MarketConditions) -> f64 {
        let base = match conditions.regime {
            MarketRegime::Bull => 0.08,
            MarketRegime::Bear => -0.04,
            MarketRegime::Volatile => 0.02,
            MarketRegime::Sideways => 0.03,
        };
        base * (1.0 + 0.25 * conditions.sentiment.clamp(-1.0, 1.0))
    }

    fn evaluate(state: &SearchState, weights: &BTreeMap<String, f64>) -> (f64, f64) {
        let drift = Self::drift(&state.market_conditions);
        let invested: f64 = weights.values().sum();
        let variance: f64 = weights
            .iter()
            .map(|(s, w)| {
                let vol = state.risks.get(s).copied().unwrap_or(0.0);
                (w * vol).powi(2)
            })
            .sum();
        (drift * invested, variance.sqrt())
    }
}

#[async_trait]
impl TreeSearchEvaluator for HeuristicTreeSearch {
    async fn search(&self, request: &TreeSearchRequest) -> Result<TreeSearchOutcome> {
        let state = &request.initial_state;
        let policy = &request.policy;
        if state.assets.is_empty() {
            bail!("search state has no assets");
        }

        let mut current = state.clone();
        let (mut ret, mut risk) = Self::evaluate(state, &current.assets);
        let mut best = policy.reward(ret, risk);
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            let mut improved = None;
            for action in policy.propose_actions(&current) {
                let mut weights = current.assets.clone();
                if let Some(w) = weights.get_mut(&action.symbol) {
                    *w = (*w + action.delta).max(0.0);
                }
                let (r, k) = Self::evaluate(state, &weights);
                let reward = policy.reward(r, k);
                if reward > best + f64::EPSILON {
                    best = reward;
                    improved = Some((weights, r, k));
                }
            }
            match improved {
                Some((weights, r, k)) => {
                    current.assets = weights;
                    ret = r;
                    risk = k;
                }
                None => break,
            }
        }

        Ok(TreeSearchOutcome {
            expected_return: ret,
            risk_assessment: risk.clamp(0.0, 1.0),
            confidence_interval: (ret - 1.96 * risk, ret + 1.96 * risk),
            iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(regime: MarketRegime) -> SearchState {
        SearchState {
            assets: [("AAA".to_string(), 0.5), ("BBB".to_string(), 0.5)].into_iter().collect(),
            timeframe: "1d".to_string(),
            risks: [("AAA".to_string(), 0.2), ("BBB".to_string(), 0.4)].into_iter().collect(),
            market_conditions: MarketConditions { regime, sentiment: 0.0 },
            target_metrics: TargetMetrics::default(),
        }
    }

    #[test]
    fn test_actions_respect_total_weight() {
        let policy = CandidatePolicy::default();
        let actions = policy.propose_actions(&state(MarketRegime::Bull));
        // fully invested: only reductions are possible
        assert!(actions.iter().all(|a| a.delta < 0.0));
        assert_eq!(actions.len(), 2);
    }

    #[tokio::test]
    async fn test_bear_market_reduces_exposure() {
        let search = HeuristicTreeSearch::default();
        let request = TreeSearchRequest {
            initial_state: state(MarketRegime::Bear),
            policy: CandidatePolicy::default(),
        };
        let outcome = search.search(&request).await.unwrap();
        assert!(outcome.iterations > 0);
        assert!(outcome.expected_return > -0.04);
        assert!((0.0..=1.0).contains(&outcome.risk_assessment));
        assert!(outcome.confidence_interval.0 <= outcome.confidence_interval.1);
    }
}
