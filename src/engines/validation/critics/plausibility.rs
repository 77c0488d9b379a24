use super::base::{numeric_params, CodeText, Critic, Findings};
use crate::types::{Candidate, CriticFeedback, MarketContext, Severity};
use anyhow::Result;

const MAX_RETURN: f64 = 0.5;
const MIN_VOLATILITY: f64 = 0.01;
const MAX_SHARPE: f64 = 3.0;
const MAX_ALPHA: f64 = 0.10;
const LIQUIDITY_PORTFOLIO_SIZE: f64 = 100_000_000.0;
const SUB_DAILY_FREQUENCIES: &[&str] = &["intraday", "hourly", "minute", "tick", "realtime"];

/// Flags performance claims and settings that are too good to be true
pub struct PlausibilityCritic;

impl PlausibilityCritic {
    fn claimed(candidate: &Candidate, needles: &[&str]) -> Option<f64> {
        numeric_params(candidate, needles)
            .map(|(_, v)| v)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

impl Critic for PlausibilityCritic {
    fn name(&self) -> &str {
        "Plausibility"
    }

    fn description(&self) -> &str {
        "Checks return, volatility, risk-adjusted ratio and alpha expectations against realistic bounds"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &MarketContext) -> Result<CriticFeedback> {
        let code = CodeText::new(&candidate.code);
        let performance = candidate.performance.as_ref();
        let mut findings = Findings::new();
        let mut severe = false;

        let expected_return = Self::claimed(candidate, &["expectedreturn", "targetreturn"])
            .or(performance.map(|p| p.returns));
        if let Some(r) = expected_return.filter(|r| *r > MAX_RETURN) {
            severe = true;
            findings.flag(
                format!("Expected return of {:.0}% is implausible", r * 100.0),
                "Re-examine the backtest for overfitting or look-ahead effects",
                0.4,
            );
        }

        let volatility = Self::claimed(candidate, &["expectedvolatility", "volatilitytarget"])
            .or(performance.map(|p| p.risk).filter(|r| *r > 0.0));
        if let Some(v) = volatility.filter(|v| *v < MIN_VOLATILITY) {
            findings.flag(
                format!("Volatility of {:.2}% is unrealistically low", v * 100.0),
                "Use realised volatility from market data rather than an assumed figure",
                0.2,
            );
        }

        let sharpe = Self::claimed(candidate, &["sharpe"])
            .or(performance.map(|p| p.sharpe_like_ratio));
        if let Some(s) = sharpe.filter(|s| *s > MAX_SHARPE) {
            severe = true;
            findings.flag(
                format!("Risk-adjusted ratio of {:.2} exceeds {:.1}", s, MAX_SHARPE),
                "Validate out of sample before trusting the risk-adjusted ratio",
                0.3,
            );
        }

        if let Some(a) = Self::claimed(candidate, &["alpha"]).filter(|a| *a > MAX_ALPHA) {
            findings.flag(
                format!("Alpha expectation of {:.0}% is unrealistic", a * 100.0),
                "Benchmark alpha against comparable strategies",
                0.2,
            );
        }

        let portfolio_size = Self::claimed(candidate, &["portfoliosize", "capital", "aum"]);
        if portfolio_size.is_some_and(|p| p > LIQUIDITY_PORTFOLIO_SIZE) && !code.contains("liquidity") {
            findings.flag(
                "Large portfolio without liquidity modelling",
                "Model market impact and liquidity constraints for large positions",
                0.2,
            );
        }

        let sub_daily = candidate
            .param_str("rebalanceFrequency")
            .map(|f| SUB_DAILY_FREQUENCIES.contains(&f.to_lowercase().as_str()))
            .unwrap_or(false)
            || candidate.param_f64("rebalanceHours").is_some_and(|h| h < 24.0);
        if sub_daily {
            findings.flag(
                "Sub-daily rebalancing",
                "Rebalance at most daily unless execution costs are modelled precisely",
                0.1,
            );
        }

        let severity = if findings.is_empty() {
            Severity::Low
        } else if severe {
            Severity::High
        } else if findings.count() >= 2 {
            Severity::Medium
        } else {
            Severity::Low
        };

        Ok(findings.into_feedback(self.name(), severity))
    }
}
