mod common;

use algoforge::config::AppConfig;
use algoforge::engines::analysis::synthesis::synthesize;
use algoforge::engines::analysis::{
    confidence_score, preprocess, AnalysisOrchestrator, AnalysisRequest, MarketAnalysis,
    MarketRegime,
};
use algoforge::engines::evaluation::HeuristicBacktest;
use algoforge::error::ForgeError;
use algoforge::oracle::{OracleClient, OracleRequestKind};
use algoforge::types::{AssetSeries, MarketContext, TargetMetrics};
use common::{candidate, sample_context, CountingBacktest, FixedTreeSearch, ScriptedOracle};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn small_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.evolution.population_size = 4;
    config.evolution.max_generations = 2;
    config.evolution.elite_ratio = 0.5;
    config.evolution.diversity_threshold = 0.0;
    config.evolution.seed = Some(11);
    config.verification.max_iterations = 2;
    config.oracle.timeout_secs = 1;
    config
}

/// Replies to analysis requests with a synthesis, to everything else with a
/// candidate proposal.
fn analysis_oracle() -> ScriptedOracle {
    ScriptedOracle::new(|n, request| {
        let body = if request.kind == OracleRequestKind::Analysis {
            json!({
                "insights": ["Momentum is persistent"],
                "recommendations": ["Tighten stops", "Tighten stops"],
                "riskFactors": ["Rate volatility"]
            })
        } else {
            json!({
                "code": format!("function strategy(context) {{ return v{}(context); }}", n),
                "description": format!("Proposal {}", n),
                "parameters": { "exposure": 0.7 }
            })
        };
        Ok(body.to_string())
    })
}

fn orchestrator(config: AppConfig, oracle: ScriptedOracle, tree: FixedTreeSearch) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(
        config,
        Arc::new(oracle),
        Arc::new(CountingBacktest::new()),
        Arc::new(tree),
    )
    .unwrap()
}

fn request(context: MarketContext) -> AnalysisRequest {
    AnalysisRequest {
        context,
        targets: TargetMetrics::default(),
        candidate: None,
    }
}

#[test]
fn test_preprocess_normalises_and_profiles() {
    let snapshot = preprocess(&sample_context()).unwrap();

    assert_eq!(snapshot.symbols, vec!["AAA", "BBB"]);
    assert_eq!(snapshot.normalized["AAA"][0], 1.0);
    assert!((snapshot.normalized["BBB"][7] - 1.04).abs() < 1e-9);
    assert_eq!(snapshot.correlation.len(), 2);
    assert_eq!(snapshot.correlation[0][0], 1.0);
    assert_eq!(snapshot.correlation[0][1], snapshot.correlation[1][0]);
    assert!(snapshot.sentiment > 0.0);
    assert!(snapshot.risk["AAA"].max_drawdown > 0.0);
    assert_eq!(snapshot.regime, MarketRegime::Bull);
}

#[test]
fn test_preprocess_rejects_bad_input() {
    let empty = MarketContext {
        assets: Vec::new(),
        headlines: Vec::new(),
        timeframe: "1d".to_string(),
    };
    assert!(matches!(preprocess(&empty), Err(ForgeError::Preprocessing(_))));

    let mut short = sample_context();
    short.assets[0].prices = vec![100.0];
    assert!(matches!(preprocess(&short), Err(ForgeError::Preprocessing(_))));

    let mut negative = sample_context();
    negative.assets.push(AssetSeries {
        symbol: "CCC".to_string(),
        prices: vec![10.0, -1.0, 11.0],
        volumes: Vec::new(),
    });
    assert!(matches!(preprocess(&negative), Err(ForgeError::Preprocessing(_))));

    let mut nan = sample_context();
    nan.assets[1].prices[3] = f64::NAN;
    assert!(matches!(preprocess(&nan), Err(ForgeError::Preprocessing(_))));
}

#[test]
fn test_confidence_formula() {
    assert!((confidence_score(0.5, 0.5, false) - 0.5).abs() < 1e-9);
    assert!((confidence_score(0.5, 0.5, true) - 0.6).abs() < 1e-9);
    assert_eq!(confidence_score(0.95, 0.0, true), 1.0);
}

#[tokio::test]
async fn test_end_to_end_analysis_with_evolution() {
    let orchestrator = orchestrator(small_config(), analysis_oracle(), FixedTreeSearch::returning(0.9));

    let report = orchestrator
        .analyze(request(sample_context()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.generations.len(), 2);
    assert_eq!(report.verification.feedback.len(), 5);
    assert!(report.verification.iterations <= 2);
    assert!(!report.analysis_fallback);
    assert_eq!(report.analysis.insights, vec!["Momentum is persistent".to_string()]);
    assert_eq!(report.recommendations.optimization_suggestions, vec!["Tighten stops".to_string()]);
    assert!(report
        .recommendations
        .risk_warnings
        .iter()
        .any(|w| w.contains("High forward-looking risk")));
    assert!(report.recommendations.risk_warnings.contains(&"Rate volatility".to_string()));

    let expected = confidence_score(report.verification.score, 0.9, report.verification.converged);
    assert!((report.confidence_score - expected).abs() < 1e-9);
    assert!(report.confidence_score <= 1.0);
    assert!(report.verification.candidate.validation.is_some());
}

#[tokio::test]
async fn test_supplied_candidate_skips_evolution() {
    let oracle = analysis_oracle();
    let orchestrator = orchestrator(small_config(), oracle, FixedTreeSearch::returning(0.1));
    let mut req = request(sample_context());
    req.candidate = Some(candidate("momentum()", json!({ "exposure": 1.0 })));

    let report = orchestrator.analyze(req, &CancellationToken::new()).await.unwrap();

    assert!(report.generations.is_empty());
    assert!(report.performance.is_some());
    assert!(report
        .recommendations
        .risk_warnings
        .iter()
        .all(|w| !w.contains("High forward-looking risk")));
}

#[tokio::test]
async fn test_synthesis_falls_back_on_unreachable_oracle() {
    let mut config = small_config();
    config.analysis.use_evolution = false;
    let orchestrator = orchestrator(config, ScriptedOracle::failing(), FixedTreeSearch::returning(0.2));

    let report = orchestrator
        .analyze(request(sample_context()), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.analysis_fallback);
    assert_eq!(report.analysis, MarketAnalysis::generic());
}

#[tokio::test]
async fn test_preprocessing_failure_propagates() {
    let orchestrator = orchestrator(small_config(), analysis_oracle(), FixedTreeSearch::returning(0.2));
    let mut context = sample_context();
    context.assets.clear();

    let result = orchestrator.analyze(request(context), &CancellationToken::new()).await;
    assert!(matches!(result, Err(ForgeError::Preprocessing(_))));
}

#[tokio::test]
async fn test_tree_search_failure_propagates() {
    let orchestrator = orchestrator(small_config(), analysis_oracle(), FixedTreeSearch::failing());

    let result = orchestrator
        .analyze(request(sample_context()), &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(ForgeError::TreeSearch(_))));
}

#[tokio::test]
async fn test_tree_search_timeout_propagates() {
    let mut config = small_config();
    config.analysis.use_evolution = false;
    config.analysis.tree_search_timeout_secs = 1;
    let mut tree = FixedTreeSearch::returning(0.2);
    tree.delay = Some(Duration::from_secs(3));
    let orchestrator = orchestrator(config, analysis_oracle(), tree);

    let result = orchestrator
        .analyze(request(sample_context()), &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(ForgeError::TreeSearch(_))));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let orchestrator = orchestrator(small_config(), analysis_oracle(), FixedTreeSearch::returning(0.2));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = orchestrator.analyze(request(sample_context()), &cancel).await;
    assert!(matches!(result, Err(ForgeError::Cancelled)));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = small_config();
    config.verification.min_score = 1.5;

    let result = AnalysisOrchestrator::new(
        config,
        Arc::new(analysis_oracle()),
        Arc::new(CountingBacktest::new()),
        Arc::new(FixedTreeSearch::returning(0.2)),
    );
    assert!(matches!(result, Err(ForgeError::Configuration(_))));
}

fn falling_context() -> MarketContext {
    MarketContext {
        assets: vec![
            AssetSeries {
                symbol: "AAA".to_string(),
                prices: vec![100.0, 97.0, 95.0, 92.0, 90.0, 86.0, 83.0, 80.0],
                volumes: Vec::new(),
            },
            AssetSeries {
                symbol: "BBB".to_string(),
                prices: vec![50.0, 49.0, 47.5, 46.0, 45.2, 44.0, 42.8, 41.0],
                volumes: Vec::new(),
            },
        ],
        headlines: vec!["Markets plunge on recession fears".to_string()],
        timeframe: "1d".to_string(),
    }
}

#[tokio::test]
async fn test_repeated_analyses_do_not_share_backtests() {
    let mut config = small_config();
    config.analysis.use_evolution = false;
    let orchestrator = AnalysisOrchestrator::new(
        config,
        Arc::new(ScriptedOracle::failing()),
        Arc::new(HeuristicBacktest),
        Arc::new(FixedTreeSearch::returning(0.2)),
    )
    .unwrap();
    let held = candidate("hold()", json!({ "signal": "hold", "exposure": 1.0 }));

    let mut rising = request(sample_context());
    rising.candidate = Some(held.clone());
    let mut falling = request(falling_context());
    falling.candidate = Some(held);

    let up = orchestrator.analyze(rising, &CancellationToken::new()).await.unwrap();
    let down = orchestrator.analyze(falling, &CancellationToken::new()).await.unwrap();

    assert!(up.performance.unwrap().returns > 0.0);
    assert!(down.performance.unwrap().returns < 0.0);
}

#[tokio::test]
async fn test_cancelled_during_evolution_is_not_reported() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let oracle = ScriptedOracle::new(move |n, _| {
        trigger.cancel();
        Ok(json!({
            "code": format!("function strategy(context) {{ return v{}(context); }}", n),
            "description": "Proposal",
            "parameters": { "exposure": 0.7 }
        })
        .to_string())
    });
    let orchestrator = orchestrator(small_config(), oracle, FixedTreeSearch::returning(0.2));

    let result = orchestrator.analyze(request(sample_context()), &cancel).await;
    assert!(matches!(result, Err(ForgeError::Cancelled)));
}

#[tokio::test]
async fn test_synthesis_rejects_wrong_shape() {
    let suggestion = ScriptedOracle::replying(r#"{"code":"x","description":"y","parameters":{}}"#);
    let client = OracleClient::new(Arc::new(suggestion), Duration::from_secs(1));
    let (analysis, fallback) = synthesize(&client, "summary").await;
    assert!(fallback);
    assert_eq!(analysis, MarketAnalysis::generic());

    let empty = OracleClient::new(Arc::new(ScriptedOracle::replying("{}")), Duration::from_secs(1));
    assert!(synthesize(&empty, "summary").await.1);

    let valid = ScriptedOracle::replying(
        r#"{"insights":["a"],"recommendations":[],"riskFactors":["b"]}"#,
    );
    let client = OracleClient::new(Arc::new(valid), Duration::from_secs(1));
    let (analysis, fallback) = synthesize(&client, "summary").await;
    assert!(!fallback);
    assert_eq!(analysis.risk_factors, vec!["b".to_string()]);
}
