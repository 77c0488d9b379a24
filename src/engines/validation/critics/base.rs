use crate::types::{Candidate, CriticFeedback, MarketContext, Severity};
use anyhow::Result;

/// A stateless reviewer of one concern.
///
/// Critics inspect the candidate's code text and parameters with keyword
/// heuristics. They are screening rules, not static analysis: a keyword being
/// present says nothing about whether the code actually handles the concern.
pub trait Critic: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn evaluate(&self, candidate: &Candidate, context: &MarketContext) -> Result<CriticFeedback>;
}

/// Lowercased code text with keyword helpers
pub struct CodeText(String);

impl CodeText {
    pub fn new(code: &str) -> Self {
        Self(code.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }

    pub fn contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.0.contains(n))
    }

    pub fn first_match<'a>(&self, needles: &[&'a str]) -> Option<&'a str> {
        needles.iter().copied().find(|n| self.0.contains(n))
    }
}

/// Issues found by a critic, each with a suggestion and a score penalty.
#[derive(Debug, Default)]
pub struct Findings {
    issues: Vec<String>,
    suggestions: Vec<String>,
    penalty: f64,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&mut self, issue: impl Into<String>, suggestion: impl Into<String>, penalty: f64) {
        self.issues.push(issue.into());
        self.suggestions.push(suggestion.into());
        self.penalty += penalty;
    }

    pub fn count(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn score(&self) -> f64 {
        (1.0 - self.penalty).max(0.0)
    }

    pub fn into_feedback(self, critic: &str, severity: Severity) -> CriticFeedback {
        let score = self.score();
        let is_valid = self.issues.is_empty();
        let feedback = if is_valid {
            "No issues found".to_string()
        } else {
            self.issues.join("; ")
        };

        CriticFeedback {
            critic: critic.to_string(),
            is_valid,
            score,
            severity,
            feedback,
            suggestions: self.suggestions,
        }
    }
}

/// Numeric parameters whose lowercased name contains any of `needles`.
pub fn numeric_params<'a>(
    candidate: &'a Candidate,
    needles: &'a [&'a str],
) -> impl Iterator<Item = (&'a str, f64)> + 'a {
    candidate.parameters.iter().filter_map(move |(key, value)| {
        let lower = key.to_lowercase();
        if needles.iter().any(|n| lower.contains(n)) {
            value.as_f64().map(|v| (key.as_str(), v))
        } else {
            None
        }
    })
}

/// Feedback emitted in place of a critic that failed internally.
pub fn low_confidence_feedback(critic: &str, reason: &str) -> CriticFeedback {
    CriticFeedback {
        critic: critic.to_string(),
        is_valid: false,
        score: 0.5,
        severity: Severity::Low,
        feedback: format!("Critic could not evaluate the candidate: {}", reason),
        suggestions: vec![format!("Re-run the {} review", critic)],
    }
}
