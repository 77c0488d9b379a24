use super::base::{CodeText, Critic, Findings};
use crate::types::{Candidate, CriticFeedback, MarketContext, Severity};
use anyhow::Result;

const MAX_LEVERAGE: f64 = 3.0;

/// Flags strategies that ignore basic portfolio-management principles
pub struct DomainPrinciplesCritic;

impl Critic for DomainPrinciplesCritic {
    fn name(&self) -> &str {
        "Domain Principles"
    }

    fn description(&self) -> &str {
        "Checks for risk management, diversification, position sizing, leverage, regime awareness and transaction costs"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &MarketContext) -> Result<CriticFeedback> {
        let code = CodeText::new(&candidate.code);
        let mut findings = Findings::new();

        let missing_risk = !code.contains_any(&["risk", "volatility", "drawdown", "stop"]);
        if missing_risk {
            findings.flag(
                "No risk or volatility management",
                "Scale exposure by realised volatility or add a drawdown stop",
                0.3,
            );
        }

        if !code.contains_any(&["diversif", "correlation", "covariance", "assets.map", "portfolio"]) {
            findings.flag(
                "No diversification or correlation handling",
                "Account for cross-asset correlation when allocating",
                0.2,
            );
        }

        if !code.contains_any(&["positionsize", "position_size", "sizing", "weight", "allocation"]) {
            findings.flag(
                "No position sizing logic",
                "Size positions explicitly instead of trading fixed units",
                0.2,
            );
        }

        let leverage = candidate.param_f64("leverage").unwrap_or(1.0);
        let excessive_leverage = leverage > MAX_LEVERAGE;
        if excessive_leverage {
            findings.flag(
                format!("Leverage {:.1}x exceeds {:.1}x", leverage, MAX_LEVERAGE),
                format!("Reduce leverage to at most {:.1}x", MAX_LEVERAGE),
                0.3,
            );
        }

        if !code.contains_any(&["regime", "market_state", "marketstate", "trend"]) {
            findings.flag(
                "No market regime awareness",
                "Adapt behaviour to trending, ranging and volatile regimes",
                0.1,
            );
        }

        if !code.contains_any(&["cost", "commission", "slippage", "fee", "spread"]) {
            findings.flag(
                "Transaction costs are not modelled",
                "Deduct commission and slippage from simulated returns",
                0.1,
            );
        }

        let severity = if findings.is_empty() {
            Severity::Low
        } else if missing_risk || excessive_leverage {
            Severity::High
        } else if findings.count() >= 3 {
            Severity::Medium
        } else {
            Severity::Low
        };

        Ok(findings.into_feedback(self.name(), severity))
    }
}
