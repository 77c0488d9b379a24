mod common;

use algoforge::config::VerificationConfig;
use algoforge::engines::validation::{Critic, CriticPanel, VerificationLoop};
use algoforge::oracle::client::{FALLBACK_CODE, FALLBACK_DESCRIPTION};
use algoforge::oracle::OracleClient;
use algoforge::types::Severity;
use common::{candidate, sample_context, FixedCritic, ScriptedOracle};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn config(max_iterations: usize) -> VerificationConfig {
    VerificationConfig {
        max_iterations,
        convergence_threshold: 0.85,
        min_score: 0.7,
        require_all_critics: false,
    }
}

fn panel(critics: Vec<FixedCritic>) -> CriticPanel {
    CriticPanel::with_critics(
        critics
            .into_iter()
            .map(|c| Arc::new(c) as Arc<dyn Critic>)
            .collect(),
    )
}

fn verifier(config: VerificationConfig, panel: CriticPanel, oracle: Arc<ScriptedOracle>) -> VerificationLoop {
    VerificationLoop::new(config, panel, OracleClient::new(oracle, Duration::from_millis(100)))
}

fn refined_reply() -> String {
    json!({
        "code": "function strategy(context) { return riskManaged(context); }",
        "description": "Refined strategy",
        "parameters": { "lookback": 30 }
    })
    .to_string()
}

#[tokio::test]
async fn test_single_iteration_budget_never_refines() {
    let oracle = Arc::new(ScriptedOracle::replying(&refined_reply()));
    let loop_ = verifier(
        config(1),
        panel(vec![FixedCritic::failing("Math", 0.1, Severity::High)]),
        oracle.clone(),
    );

    let result = loop_
        .verify(candidate("code", json!({})), &sample_context(), &CancellationToken::new())
        .await;

    assert_eq!(result.iterations, 1);
    assert!(!result.converged);
    assert!(!result.is_valid);
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn test_converges_immediately_when_all_critics_pass() {
    let oracle = Arc::new(ScriptedOracle::replying(&refined_reply()));
    let loop_ = verifier(
        config(5),
        panel(vec![FixedCritic::passing("A"), FixedCritic::passing("B")]),
        oracle.clone(),
    );

    let result = loop_
        .verify(candidate("code", json!({})), &sample_context(), &CancellationToken::new())
        .await;

    assert_eq!(result.iterations, 1);
    assert!(result.converged);
    assert!(result.is_valid);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.candidate.validation.as_ref().map(|v| v.valid), Some(true));
}

#[tokio::test]
async fn test_exhausts_budget_without_convergence() {
    let oracle = Arc::new(ScriptedOracle::replying(&refined_reply()));
    let loop_ = verifier(
        config(3),
        panel(vec![FixedCritic::failing("Math", 0.3, Severity::High)]),
        oracle.clone(),
    );

    let result = loop_
        .verify(candidate("code", json!({})), &sample_context(), &CancellationToken::new())
        .await;

    assert_eq!(result.iterations, 3);
    assert!(!result.converged);
    assert!(!result.is_valid);
    assert_eq!(oracle.calls(), 2);
    assert_eq!(result.candidate.description, "Refined strategy");
    assert_eq!(result.feedback.len(), 1);
}

#[tokio::test]
async fn test_critical_issue_blocks_validity_despite_high_score() {
    let oracle = Arc::new(ScriptedOracle::failing());
    let loop_ = verifier(
        config(3),
        panel(vec![
            FixedCritic::failing("Data", 0.9, Severity::Critical),
            FixedCritic::passing("A"),
            FixedCritic::passing("B"),
            FixedCritic::passing("C"),
            FixedCritic::passing("D"),
        ]),
        oracle,
    );

    let result = loop_
        .verify(candidate("code", json!({})), &sample_context(), &CancellationToken::new())
        .await;

    // (0.9*2 + 4*1.0*0.5) / 4 = 0.95
    assert!((result.score - 0.95).abs() < 1e-9);
    assert!(result.converged);
    assert!(!result.is_valid);
    let summary = result.candidate.validation.unwrap();
    assert_eq!(summary.errors.len(), 1);
}

#[tokio::test]
async fn test_require_all_critics_gates_convergence() {
    let oracle = Arc::new(ScriptedOracle::failing());
    let mut cfg = config(2);
    cfg.convergence_threshold = 0.99;
    cfg.require_all_critics = true;
    let loop_ = verifier(
        cfg,
        panel(vec![FixedCritic::passing("A"), FixedCritic::failing("B", 0.95, Severity::Low)]),
        oracle,
    );

    let result = loop_
        .verify(candidate("code", json!({})), &sample_context(), &CancellationToken::new())
        .await;

    assert!(!result.converged);
    assert_eq!(result.iterations, 2);
}

#[tokio::test]
async fn test_cancellation_stops_after_current_iteration() {
    let oracle = Arc::new(ScriptedOracle::replying(&refined_reply()));
    let loop_ = verifier(
        config(5),
        panel(vec![FixedCritic::failing("Math", 0.2, Severity::High)]),
        oracle.clone(),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = loop_
        .verify(candidate("code", json!({})), &sample_context(), &cancel)
        .await;

    assert_eq!(result.iterations, 1);
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn test_refine_merges_parameters_key_by_key() {
    let oracle = Arc::new(ScriptedOracle::replying(&format!("```json\n{}\n```", refined_reply())));
    let loop_ = verifier(config(3), CriticPanel::standard(), oracle);
    let mut original = candidate("old code", json!({ "lookback": 10, "exposure": 0.8 }));
    original.fitness = Some(0.4);
    let id = original.id;

    let refined = loop_.refine(original, &[], &sample_context()).await;

    assert_eq!(refined.id, id);
    assert_eq!(refined.description, "Refined strategy");
    assert_eq!(refined.param_f64("lookback"), Some(30.0));
    assert_eq!(refined.param_f64("exposure"), Some(0.8));
    assert_eq!(refined.fitness, None);
}

#[tokio::test]
async fn test_refine_with_malformed_reply_uses_fallback() {
    let oracle = Arc::new(ScriptedOracle::replying("I think you should buy low and sell high."));
    let loop_ = verifier(config(3), CriticPanel::standard(), oracle);
    let original = candidate("old code", json!({ "lookback": 10 }));

    let refined = loop_.refine(original, &[], &sample_context()).await;

    assert_eq!(refined.code, FALLBACK_CODE);
    assert_eq!(refined.description, FALLBACK_DESCRIPTION);
    assert_eq!(refined.parameters.get("conservativeMode"), Some(&json!(true)));
}

#[tokio::test]
async fn test_refine_with_partial_json_uses_fallback() {
    let oracle = Arc::new(ScriptedOracle::replying(r#"{"description": "missing code"}"#));
    let loop_ = verifier(config(3), CriticPanel::standard(), oracle);

    let refined = loop_
        .refine(candidate("old code", json!({})), &[], &sample_context())
        .await;

    assert_eq!(refined.code, FALLBACK_CODE);
}

#[tokio::test]
async fn test_refine_keeps_candidate_when_oracle_unreachable() {
    let loop_ = verifier(config(3), CriticPanel::standard(), Arc::new(ScriptedOracle::failing()));
    let original = candidate("old code", json!({ "lookback": 10 }));

    let refined = loop_.refine(original.clone(), &[], &sample_context()).await;

    assert_eq!(refined.code, original.code);
    assert_eq!(refined.parameters, original.parameters);
}

#[tokio::test]
async fn test_refine_keeps_candidate_on_timeout() {
    let oracle = ScriptedOracle::replying(&refined_reply()).with_delay(Duration::from_millis(500));
    let loop_ = verifier(config(3), CriticPanel::standard(), Arc::new(oracle));
    let original = candidate("old code", json!({}));

    let refined = loop_.refine(original.clone(), &[], &sample_context()).await;

    assert_eq!(refined.code, original.code);
}
