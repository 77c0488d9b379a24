use super::base::{numeric_params, CodeText, Critic, Findings};
use crate::types::{Candidate, CriticFeedback, MarketContext, Severity};
use anyhow::Result;

const MAX_POSITION_FRACTION: f64 = 0.25;
const MANIPULATION_MARKERS: &[&str] = &[
    "spoof",
    "layering",
    "wash trade",
    "wash_trade",
    "washtrade",
    "pump and dump",
    "pump_and_dump",
    "front-run",
    "front_run",
    "frontrun",
    "manipulat",
    "marking the close",
];
const INSIDER_MARKERS: &[&str] = &["insider", "non-public", "nonpublic", "mnpi", "material non"];

/// Flags regulatory exposure: disclosures, market abuse, limits and audit trail
pub struct RegulatoryComplianceCritic;

impl Critic for RegulatoryComplianceCritic {
    fn name(&self) -> &str {
        "Regulatory Compliance"
    }

    fn description(&self) -> &str {
        "Checks for risk disclosure, suitability, market manipulation, insider trading, position limits and audit logging"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &MarketContext) -> Result<CriticFeedback> {
        let code = CodeText::new(&candidate.code);
        let text = CodeText::new(&format!("{}\n{}", candidate.code, candidate.description));
        let mut findings = Findings::new();

        if !code.contains_any(&["disclosure", "disclaimer", "risk warning", "riskwarning"]) {
            findings.flag(
                "No risk disclosure",
                "Attach a risk disclosure to the strategy output",
                0.1,
            );
        }

        if !code.contains_any(&["suitability", "risk tolerance", "risktolerance", "investor profile"]) {
            findings.flag(
                "No suitability assessment",
                "Check the strategy against the investor's risk tolerance",
                0.1,
            );
        }

        let manipulation = text.first_match(MANIPULATION_MARKERS);
        if let Some(marker) = manipulation {
            findings.flag(
                format!("Possible market manipulation ('{}')", marker),
                "Remove any logic that could constitute market manipulation",
                0.8,
            );
        }

        let insider = text.first_match(INSIDER_MARKERS);
        if let Some(marker) = insider {
            findings.flag(
                format!("Possible use of insider information ('{}')", marker),
                "Use only public information",
                0.8,
            );
        }

        let mut limit_breached = false;
        for (key, value) in numeric_params(candidate, &["maxposition", "positionlimit"]) {
            if value > MAX_POSITION_FRACTION {
                limit_breached = true;
                findings.flag(
                    format!("{} = {:.2} exceeds the {:.0}% position limit", key, value, MAX_POSITION_FRACTION * 100.0),
                    format!("Cap {} at {:.2}", key, MAX_POSITION_FRACTION),
                    0.2,
                );
            }
        }

        if !code.contains_any(&["audit", "logging", "logger", "log("]) {
            findings.flag(
                "No audit logging of decisions",
                "Record every trading decision for audit",
                0.1,
            );
        }

        let severity = if manipulation.is_some() || insider.is_some() {
            Severity::Critical
        } else if limit_breached {
            Severity::High
        } else if findings.count() >= 3 {
            Severity::Medium
        } else {
            Severity::Low
        };

        Ok(findings.into_feedback(self.name(), severity))
    }
}
