use crate::engines::metrics::RISK_EPSILON;
use crate::types::{BacktestOutcome, TargetMetrics};

/// Relative ranking signal; unbounded above.
///
/// `0.4 * (return / target) + 0.3 * 1 / (1 + risk) + 0.3 * return / max(risk, eps)`
pub fn fitness_score(outcome: &BacktestOutcome, targets: &TargetMetrics) -> f64 {
    let target = if targets.target_return.abs() < RISK_EPSILON {
        RISK_EPSILON
    } else {
        targets.target_return
    };
    let risk = outcome.risk_assessment.max(0.0);

    0.4 * (outcome.expected_return / target)
        + 0.3 * (1.0 / (1.0 + risk))
        + 0.3 * (outcome.expected_return / risk.max(RISK_EPSILON))
}
