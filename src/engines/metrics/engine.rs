// src/engines/metrics/engine.rs
use crate::engines::metrics::RiskMetrics;
use crate::types::{BacktestOutcome, PerformanceMetrics};

/// Guard for divisions by a risk figure
pub const RISK_EPSILON: f64 = 1e-6;

pub struct MetricsEngine;

impl MetricsEngine {
    /// Reporting metrics for one backtest. Drawdown comes from the equity
    /// curve when one is supplied, otherwise from the lower confidence bound.
    pub fn performance(outcome: &BacktestOutcome) -> PerformanceMetrics {
        let max_drawdown = if outcome.equity_curve.len() >= 2 {
            RiskMetrics::max_drawdown(&outcome.equity_curve)
        } else {
            (-outcome.confidence_interval.0).max(0.0)
        };

        PerformanceMetrics {
            returns: outcome.expected_return,
            risk: outcome.risk_assessment,
            sharpe_like_ratio: outcome.expected_return / outcome.risk_assessment.max(RISK_EPSILON),
            max_drawdown,
        }
    }
}
