use crate::engines::metrics::RiskMetrics;
use crate::types::{BacktestOutcome, Candidate, MarketContext};
use anyhow::{bail, Result};
use async_trait::async_trait;

/// Executes a candidate against market context. Errors mean the candidate
/// could not be run at all.
#[async_trait]
pub trait Backtest: Send + Sync {
    async fn run(&self, candidate: &Candidate, context: &MarketContext) -> Result<BacktestOutcome>;
}

/// Deterministic stand-in for a real backtest.
///
/// Holds the candidate's portfolio weights and takes a position each bar from
/// the previous bar's return: with the trend for `signal = "momentum"`,
/// against it for `"mean_reversion"`, always long otherwise. `exposure` and
/// `leverage` scale the position.
#[derive(Debug, Default, Clone)]
pub struct HeuristicBacktest;

impl HeuristicBacktest {
    fn weights(candidate: &Candidate, context: &MarketContext) -> Vec<f64> {
        let n = context.assets.len();
        let explicit = candidate.parameters.get("weights").and_then(|w| w.as_object());
        let raw: Vec<f64> = context
            .assets
            .iter()
            .map(|a| {
                explicit
                    .and_then(|w| w.get(&a.symbol))
                    .and_then(|v| v.as_f64())
                    .unwrap_or(1.0 / n as f64)
            })
            .collect();
        let total: f64 = raw.iter().map(|w| w.abs()).sum();
        if total == 0.0 {
            return vec![0.0; n];
        }
        raw.iter().map(|w| w / total).collect()
    }

    fn position(signal: &str, previous_return: Option<f64>) -> f64 {
        match (signal, previous_return) {
            ("momentum", Some(r)) => r.signum(),
            ("mean_reversion", Some(r)) => -r.signum(),
            ("momentum" | "mean_reversion", None) => 0.0,
            _ => 1.0,
        }
    }
}

#[async_trait]
impl Backtest for HeuristicBacktest {
    async fn run(&self, candidate: &Candidate, context: &MarketContext) -> Result<BacktestOutcome> {
        if candidate.code.trim().is_empty() {
            bail!("candidate {} has no code to execute", candidate.id);
        }
        if context.assets.is_empty() {
            bail!("market context has no assets");
        }

        let signal = candidate.param_str("signal").unwrap_or("hold");
        let scale = candidate.param_f64("exposure").unwrap_or(1.0)
            * candidate.param_f64("leverage").unwrap_or(1.0);
        let weights = Self::weights(candidate, context);

        let asset_returns: Vec<Vec<f64>> = context
            .assets
            .iter()
            .map(|a| RiskMetrics::calculate_returns(&a.prices))
            .collect();
        let bars = asset_returns.iter().map(Vec::len).min().unwrap_or(0);
        if bars == 0 {
            bail!("market context has fewer than two prices per asset");
        }

        let portfolio: Vec<f64> = (0..bars)
            .map(|t| {
                asset_returns
                    .iter()
                    .zip(&weights)
                    .map(|(returns, w)| {
                        let previous = if t > 0 { Some(returns[t - 1]) } else { None };
                        w * Self::position(signal, previous) * scale * returns[t]
                    })
                    .sum()
            })
            .collect();

        let mut equity = Vec::with_capacity(bars + 1);
        equity.push(1.0);
        for r in &portfolio {
            let last = equity.last().copied().unwrap_or(1.0);
            equity.push(last * (1.0 + r));
        }

        let expected_return = equity.last().copied().unwrap_or(1.0) - 1.0;
        let spread = RiskMetrics::std_dev(&portfolio) * (bars as f64).sqrt();
        Ok(BacktestOutcome {
            expected_return,
            risk_assessment: spread.clamp(0.0, 1.0),
            confidence_interval: (expected_return - 1.96 * spread, expected_return + 1.96 * spread),
            iterations: bars,
            equity_curve: equity,
        })
    }
}
