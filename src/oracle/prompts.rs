use crate::types::{Candidate, CriticFeedback, MarketContext};

const RESPONSE_SHAPE: &str =
    "Respond with JSON only: {\"code\": string, \"description\": string, \"parameters\": object}.";

fn describe_context(context: &MarketContext) -> String {
    let observations = context.assets.iter().map(|a| a.prices.len()).max().unwrap_or(0);
    format!(
        "Market context: assets [{}], timeframe {}, {} observations",
        context.symbols().join(", "),
        context.timeframe,
        observations
    )
}

fn describe_parent(label: &str, candidate: &Candidate) -> String {
    format!(
        "{} ({}): fitness {:.4}\nParameters: {}",
        label,
        candidate.description,
        candidate.score(),
        serde_json::to_string(&candidate.parameters).unwrap_or_default()
    )
}

pub fn crossover_prompt(a: &Candidate, b: &Candidate, context: &MarketContext) -> String {
    format!(
        "Combine the strengths of two trading algorithms into one new algorithm.\n\n{}\n\n{}\n\n{}\n\n{}",
        describe_parent("Parent A", a),
        describe_parent("Parent B", b),
        describe_context(context),
        RESPONSE_SHAPE
    )
}

pub fn mutation_prompt(parent: &Candidate, context: &MarketContext) -> String {
    format!(
        "Propose a variation of this trading algorithm that may improve risk-adjusted returns.\n\n{}\nCode:\n{}\n\n{}\n\n{}",
        describe_parent("Parent", parent),
        parent.code,
        describe_context(context),
        RESPONSE_SHAPE
    )
}

/// Summarise every invalid critic entry with its suggestions.
pub fn refinement_prompt(
    candidate: &Candidate,
    feedback: &[CriticFeedback],
    context: &MarketContext,
) -> String {
    let issues: Vec<String> = feedback
        .iter()
        .filter(|f| !f.is_valid)
        .map(|f| {
            let mut entry = format!("- [{}] {}: {}", f.severity, f.critic, f.feedback);
            for s in &f.suggestions {
                entry.push_str(&format!("\n    * {}", s));
            }
            entry
        })
        .collect();

    format!(
        "Refine this trading algorithm to resolve the reviewer findings.\n\nDescription: {}\nCode:\n{}\nParameters: {}\n\nFindings:\n{}\n\n{}\n\n{}",
        candidate.description,
        candidate.code,
        serde_json::to_string(&candidate.parameters).unwrap_or_default(),
        issues.join("\n"),
        describe_context(context),
        RESPONSE_SHAPE
    )
}

pub fn analysis_prompt(summary: &str) -> String {
    format!(
        "Write a concise analysis of this algorithm evaluation.\n\n{}\n\nRespond with JSON only: {{\"insights\": [string], \"recommendations\": [string], \"riskFactors\": [string]}}.",
        summary
    )
}
