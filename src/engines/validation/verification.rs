use super::panel::CriticPanel;
use super::scoring::{check_convergence, has_blocking_issues, weighted_score};
use crate::config::VerificationConfig;
use crate::oracle::{prompts, OracleClient, OracleOutcome, OracleRequestKind, Suggestion};
use crate::types::{
    Candidate, CriticFeedback, MarketContext, Severity, ValidationSummary, VerificationResult,
};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Evaluating,
    Converged,
    Exhausted,
}

/// Iterative evaluate → refine loop over one candidate.
pub struct VerificationLoop {
    config: VerificationConfig,
    panel: CriticPanel,
    oracle: OracleClient,
}

impl VerificationLoop {
    pub fn new(config: VerificationConfig, panel: CriticPanel, oracle: OracleClient) -> Self {
        Self {
            config,
            panel,
            oracle,
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Runs at least one iteration. Non-convergence is a normal outcome,
    /// reported through `converged` and `is_valid`. Cancellation stops the
    /// loop after the current iteration.
    pub async fn verify(
        &self,
        candidate: Candidate,
        context: &MarketContext,
        cancel: &CancellationToken,
    ) -> VerificationResult {
        let mut candidate = candidate;
        let mut iterations = 0;
        let mut state = VerificationState::Evaluating;

        let (feedback, score) = loop {
            iterations += 1;
            let feedback = self.panel.evaluate_all(&candidate, context).await;
            let score = weighted_score(&feedback);
            let converged = check_convergence(&feedback, score, &self.config);
            debug!(
                "Verification iteration {}: score {:.3}, converged {}",
                iterations, score, converged
            );

            if converged {
                state = VerificationState::Converged;
            } else if iterations >= self.config.max_iterations {
                state = VerificationState::Exhausted;
            } else if cancel.is_cancelled() {
                info!("Verification cancelled after {} iterations", iterations);
                state = VerificationState::Exhausted;
            }
            if state != VerificationState::Evaluating {
                break (feedback, score);
            }

            candidate = self.refine(candidate, &feedback, context).await;
        };

        let converged = state == VerificationState::Converged;
        let is_valid = !has_blocking_issues(&feedback) && score >= self.config.min_score;
        info!(
            "Verification finished in state {:?} after {} iterations (score {:.3}, valid {})",
            state, iterations, score, is_valid
        );

        candidate.validation = Some(summarize(&feedback, is_valid));
        VerificationResult {
            is_valid,
            score,
            feedback,
            candidate,
            iterations,
            converged,
        }
    }

    /// Ask the oracle to fix every invalid finding and merge its proposal.
    ///
    /// A malformed reply merges the fixed fallback proposal. When the oracle
    /// cannot be reached at all the candidate is returned unchanged.
    pub async fn refine(
        &self,
        candidate: Candidate,
        feedback: &[CriticFeedback],
        context: &MarketContext,
    ) -> Candidate {
        let prompt = prompts::refinement_prompt(&candidate, feedback, context);
        match self.oracle.suggest(OracleRequestKind::Refinement, prompt).await {
            OracleOutcome::Parsed(suggestion) => merge_suggestion(candidate, suggestion),
            OracleOutcome::Fallback { reason, .. } if reason.is_unreachable() => {
                warn!("Refinement skipped, oracle unavailable: {}", reason);
                candidate
            }
            OracleOutcome::Fallback { suggestion, .. } => merge_suggestion(candidate, suggestion),
        }
    }
}

/// Replace code and description, merge parameters key by key. Fitness and
/// performance no longer describe the new signature and are cleared.
pub fn merge_suggestion(mut candidate: Candidate, suggestion: Suggestion) -> Candidate {
    candidate.code = suggestion.code;
    candidate.description = suggestion.description;
    candidate.parameters.extend(suggestion.parameters);
    candidate.fitness = None;
    candidate.performance = None;
    candidate
}

fn summarize(feedback: &[CriticFeedback], valid: bool) -> ValidationSummary {
    let (errors, warnings): (Vec<&CriticFeedback>, Vec<&CriticFeedback>) = feedback
        .iter()
        .filter(|f| !f.is_valid)
        .partition(|f| f.severity >= Severity::High);

    let describe = |f: &&CriticFeedback| format!("{}: {}", f.critic, f.feedback);
    ValidationSummary {
        valid,
        errors: errors.iter().map(describe).collect(),
        warnings: warnings.iter().map(describe).collect(),
    }
}
