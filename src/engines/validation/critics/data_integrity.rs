use super::base::{CodeText, Critic, Findings};
use crate::types::{Candidate, CriticFeedback, MarketContext, Severity};
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

static RE_PRICE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\.\d{2,}\b").expect("valid regex"));

const HARDCODED_LITERAL_LIMIT: usize = 3;
const LOOK_AHEAD_MARKERS: &[&str] = &["future", "lookahead", "look_ahead", "look-ahead", "shift(-"];

/// Flags hardcoded data, missing data hygiene and look-ahead bias
pub struct DataIntegrityCritic;

impl Critic for DataIntegrityCritic {
    fn name(&self) -> &str {
        "Data Integrity"
    }

    fn description(&self) -> &str {
        "Checks for hardcoded market data, validation and cleaning, missing-value handling, data sources and look-ahead bias"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &MarketContext) -> Result<CriticFeedback> {
        let code = CodeText::new(&candidate.code);
        let mut findings = Findings::new();

        let literals = RE_PRICE_LITERAL.find_iter(&candidate.code).count();
        if literals >= HARDCODED_LITERAL_LIMIT {
            findings.flag(
                format!("{} hardcoded numeric literals stand in for market data", literals),
                "Read prices and statistics from the market context instead of literals",
                0.2,
            );
        }

        if !code.contains_any(&["validate", "sanitize", "clean", "outlier", "dropna"]) {
            findings.flag(
                "No data validation or cleaning",
                "Validate inputs and remove outliers before computing signals",
                0.1,
            );
        }

        if !code.contains_any(&["null", "undefined", "none", "missing", "nan", "fillna", "dropna"]) {
            findings.flag(
                "No handling of missing values",
                "Handle null and missing observations explicitly",
                0.15,
            );
        }

        if !code.contains_any(&["context.", "data_source", "datasource", "fetch", "load", "feed", "market_data", "marketdata"]) {
            findings.flag(
                "No reference to a data source",
                "Take market data from the supplied context or a named feed",
                0.1,
            );
        }

        let look_ahead = code.first_match(LOOK_AHEAD_MARKERS);
        if let Some(marker) = look_ahead {
            findings.flag(
                format!("Look-ahead bias: code references '{}' data", marker),
                "Use only information available at decision time",
                0.4,
            );
        }

        let severity = if look_ahead.is_some() {
            Severity::Critical
        } else if findings.is_empty() {
            Severity::Low
        } else if findings.count() >= 3 {
            Severity::High
        } else {
            Severity::Medium
        };

        Ok(findings.into_feedback(self.name(), severity))
    }
}
