use super::critics::{
    low_confidence_feedback, Critic, DataIntegrityCritic, DomainPrinciplesCritic,
    MathematicalConsistencyCritic, PlausibilityCritic, RegulatoryComplianceCritic,
};
use crate::types::{Candidate, CriticFeedback, MarketContext};
use futures::future::join_all;
use log::{debug, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Fixed set of critics; always returns one feedback entry per critic.
#[derive(Clone)]
pub struct CriticPanel {
    critics: Vec<Arc<dyn Critic>>,
}

impl Default for CriticPanel {
    fn default() -> Self {
        Self::standard()
    }
}

impl CriticPanel {
    /// The five standard critics
    pub fn standard() -> Self {
        Self::with_critics(vec![
            Arc::new(MathematicalConsistencyCritic),
            Arc::new(DomainPrinciplesCritic),
            Arc::new(PlausibilityCritic),
            Arc::new(DataIntegrityCritic),
            Arc::new(RegulatoryComplianceCritic),
        ])
    }

    pub fn with_critics(critics: Vec<Arc<dyn Critic>>) -> Self {
        Self { critics }
    }

    pub fn len(&self) -> usize {
        self.critics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.critics.is_empty()
    }

    pub async fn evaluate_all(&self, candidate: &Candidate, context: &MarketContext) -> Vec<CriticFeedback> {
        join_all(
            self.critics
                .iter()
                .map(|critic| async move { run_guarded(critic.as_ref(), candidate, context) }),
        )
        .await
    }
}

/// Run one critic, converting errors and panics into low-confidence feedback.
fn run_guarded(critic: &dyn Critic, candidate: &Candidate, context: &MarketContext) -> CriticFeedback {
    let outcome = catch_unwind(AssertUnwindSafe(|| critic.evaluate(candidate, context)));
    match outcome {
        Ok(Ok(mut feedback)) => {
            feedback.score = if feedback.score.is_finite() {
                feedback.score.clamp(0.0, 1.0)
            } else {
                0.0
            };
            debug!(
                "{}: valid={} score={:.2} severity={}",
                feedback.critic, feedback.is_valid, feedback.score, feedback.severity
            );
            feedback
        }
        Ok(Err(e)) => {
            warn!("Critic {} failed: {}", critic.name(), e);
            low_confidence_feedback(critic.name(), &e.to_string())
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panicked".to_string());
            warn!("Critic {} panicked: {}", critic.name(), reason);
            low_confidence_feedback(critic.name(), &reason)
        }
    }
}
