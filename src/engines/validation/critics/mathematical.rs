use super::base::{numeric_params, CodeText, Critic, Findings};
use crate::types::{Candidate, CriticFeedback, MarketContext, Severity};
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

static RE_DIVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w\)\]]\s*/\s*[\w\(]").expect("valid regex"));

const DIVISION_GUARDS: &[&str] = &["!= 0", "> 0", "=== 0", "== 0", "max(", "epsilon", "1e-"];
const NAN_GUARDS: &[&str] = &["isnan", "is_nan", "isfinite", "is_finite", "nan"];
const SQRT_GUARDS: &[&str] = &["abs(", "max(0", ">= 0"];
const UNIT_INTERVAL_PARAMS: &[&str] = &["rate", "probability", "confidence"];

/// Flags numerically unsafe code and out-of-range rate parameters
pub struct MathematicalConsistencyCritic;

impl Critic for MathematicalConsistencyCritic {
    fn name(&self) -> &str {
        "Mathematical Consistency"
    }

    fn description(&self) -> &str {
        "Checks for division by zero, missing NaN/infinity guards, unchecked square roots and out-of-range rates"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &MarketContext) -> Result<CriticFeedback> {
        let code = CodeText::new(&candidate.code);
        let mut findings = Findings::new();

        let divides = RE_DIVISION.is_match(&candidate.code);
        let takes_sqrt = code.contains("sqrt(");
        let takes_log = code.contains("log(");

        if divides && !code.contains_any(DIVISION_GUARDS) {
            findings.flag(
                "Potential division by zero",
                "Guard denominators against zero, e.g. divide by max(x, epsilon)",
                0.2,
            );
        }

        if (divides || takes_sqrt || takes_log) && !code.contains_any(NAN_GUARDS) {
            findings.flag(
                "No NaN or infinity handling",
                "Check intermediate results with an is-finite test before using them",
                0.1,
            );
        }

        if takes_sqrt && !code.contains_any(SQRT_GUARDS) {
            findings.flag(
                "Square root of a possibly negative value",
                "Clamp the argument of sqrt to be non-negative",
                0.15,
            );
        }

        let mut out_of_range = false;
        for (key, value) in numeric_params(candidate, UNIT_INTERVAL_PARAMS) {
            if !(0.0..=1.0).contains(&value) {
                out_of_range = true;
                findings.flag(
                    format!("Parameter {} = {} is outside [0, 1]", key, value),
                    format!("Constrain {} to the unit interval", key),
                    0.3,
                );
            }
        }

        let severity = if findings.is_empty() {
            Severity::Low
        } else if out_of_range || findings.count() >= 3 {
            Severity::High
        } else {
            Severity::Medium
        };

        Ok(findings.into_feedback(self.name(), severity))
    }
}
