use crate::config::VerificationConfig;
use crate::types::CriticFeedback;

/// `Σ(score × weight(severity)) / Σ(weight)`; zero for no feedback.
pub fn weighted_score(feedback: &[CriticFeedback]) -> f64 {
    let total_weight: f64 = feedback.iter().map(|f| f.severity.weight()).sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    feedback
        .iter()
        .map(|f| f.score * f.severity.weight())
        .sum::<f64>()
        / total_weight
}

/// True when any entry is both invalid and critical.
pub fn has_blocking_issues(feedback: &[CriticFeedback]) -> bool {
    feedback.iter().any(CriticFeedback::is_blocking)
}

pub fn check_convergence(feedback: &[CriticFeedback], score: f64, config: &VerificationConfig) -> bool {
    if score >= config.convergence_threshold {
        return true;
    }
    if config.require_all_critics {
        return feedback.iter().all(|f| f.is_valid);
    }
    !has_blocking_issues(feedback) && score >= config.min_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn entry(severity: Severity, score: f64, is_valid: bool) -> CriticFeedback {
        CriticFeedback {
            critic: "test".to_string(),
            is_valid,
            score,
            severity,
            feedback: String::new(),
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn test_weighted_score_example() {
        let feedback = vec![entry(Severity::Critical, 0.2, false), entry(Severity::Medium, 0.9, true)];
        let score = weighted_score(&feedback);
        assert!((score - 1.3 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_score_empty() {
        assert_eq!(weighted_score(&[]), 0.0);
    }

    #[test]
    fn test_convergence_rules() {
        let config = VerificationConfig {
            max_iterations: 3,
            convergence_threshold: 0.9,
            min_score: 0.6,
            require_all_critics: false,
        };
        let ok = vec![entry(Severity::Medium, 0.7, false)];
        assert!(check_convergence(&ok, 0.7, &config));

        let blocked = vec![entry(Severity::Critical, 0.7, false)];
        assert!(!check_convergence(&blocked, 0.7, &config));
        assert!(check_convergence(&blocked, 0.95, &config));

        let strict = VerificationConfig {
            require_all_critics: true,
            ..config
        };
        assert!(!check_convergence(&ok, 0.7, &strict));
        assert!(check_convergence(&[entry(Severity::Low, 0.7, true)], 0.7, &strict));
    }
}
