use super::preprocess::{preprocess, MarketSnapshot};
use super::report::{build_recommendations, confidence_score, AnalysisReport};
use super::synthesis::synthesize;
use super::tree_search::{
    CandidatePolicy, SearchState, TreeSearchEvaluator, TreeSearchOutcome, TreeSearchRequest,
};
use crate::config::AppConfig;
use crate::engines::evaluation::{Backtest, CandidateEvaluator};
use crate::engines::generation::{LogProgressCallback, PopulationEngine, TEMPLATES};
use crate::engines::validation::{CriticPanel, VerificationLoop};
use crate::error::{ForgeError, Result};
use crate::oracle::{Oracle, OracleClient};
use crate::types::{Candidate, MarketContext, PerformanceMetrics, TargetMetrics, VerificationResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub context: MarketContext,
    #[serde(default)]
    pub targets: TargetMetrics,
    /// Analyse this candidate instead of evolving one
    #[serde(default)]
    pub candidate: Option<Candidate>,
}

/// Runs preprocessing, evolution, verification, tree search and synthesis
/// for one request. Evaluation caches live for a single `analyze` call, so
/// results never leak between market contexts.
pub struct AnalysisOrchestrator {
    config: AppConfig,
    backtest: Arc<dyn Backtest>,
    oracle: OracleClient,
    verifier: VerificationLoop,
    tree_search: Arc<dyn TreeSearchEvaluator>,
}

impl AnalysisOrchestrator {
    pub fn new(
        config: AppConfig,
        oracle: Arc<dyn Oracle>,
        backtest: Arc<dyn Backtest>,
        tree_search: Arc<dyn TreeSearchEvaluator>,
    ) -> Result<Self> {
        Self::with_panel(config, oracle, backtest, tree_search, CriticPanel::standard())
    }

    pub fn with_panel(
        config: AppConfig,
        oracle: Arc<dyn Oracle>,
        backtest: Arc<dyn Backtest>,
        tree_search: Arc<dyn TreeSearchEvaluator>,
        panel: CriticPanel,
    ) -> Result<Self> {
        config.validate()?;
        let oracle = OracleClient::new(oracle, config.oracle.timeout());
        let verifier = VerificationLoop::new(config.verification.clone(), panel, oracle.clone());
        Ok(Self {
            config,
            backtest,
            oracle,
            verifier,
            tree_search,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn analyze(
        &self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport> {
        if cancel.is_cancelled() {
            return Err(ForgeError::Cancelled);
        }
        let AnalysisRequest { context, targets, candidate } = request;

        let snapshot = preprocess(&context)?;
        let evaluator = Arc::new(CandidateEvaluator::new(
            self.backtest.clone(),
            self.config.analysis.evaluation_timeout(),
        ));
        info!(
            "Preprocessed {} assets: regime {}, sentiment {:.2}",
            snapshot.symbols.len(),
            snapshot.regime,
            snapshot.sentiment
        );

        let (mut candidate, generations) = match candidate {
            Some(candidate) => (candidate, Vec::new()),
            None if self.config.analysis.use_evolution => {
                let mut engine = PopulationEngine::new(
                    self.config.evolution.clone(),
                    evaluator.clone(),
                    self.oracle.clone(),
                )?;
                let best = engine
                    .evolve(&context, &targets, cancel, &mut LogProgressCallback)
                    .await?;
                if cancel.is_cancelled() {
                    info!("Analysis cancelled during evolution");
                    return Err(ForgeError::Cancelled);
                }
                (best, engine.history().to_vec())
            }
            None => (TEMPLATES[0].instantiate(), Vec::new()),
        };

        candidate.performance = performance_of(&evaluator, &candidate, &context).await;

        let mut verification = self.verifier.verify(candidate, &context, cancel).await;
        if verification.candidate.performance.is_none() {
            verification.candidate.performance =
                performance_of(&evaluator, &verification.candidate, &context).await;
        }
        let performance = verification.candidate.performance.clone();

        let tree_search = self.search(&verification.candidate, &snapshot, &context, targets).await?;

        let summary = summarize(&snapshot, &verification, performance.as_ref(), &tree_search);
        let (analysis, analysis_fallback) = synthesize(&self.oracle, &summary).await;

        let confidence = confidence_score(
            verification.score,
            tree_search.risk_assessment,
            verification.converged,
        );
        let recommendations = build_recommendations(
            &verification.feedback,
            &tree_search,
            &analysis,
            self.config.analysis.high_risk_threshold,
        );
        info!(
            "Analysis complete: confidence {:.2}, {} action items",
            confidence,
            recommendations.action_items.len()
        );

        Ok(AnalysisReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            regime: snapshot.regime,
            sentiment: snapshot.sentiment,
            verification,
            performance,
            tree_search,
            analysis,
            analysis_fallback,
            confidence_score: confidence,
            recommendations,
            generations,
        })
    }

    async fn search(
        &self,
        candidate: &Candidate,
        snapshot: &MarketSnapshot,
        context: &MarketContext,
        targets: TargetMetrics,
    ) -> Result<TreeSearchOutcome> {
        let request = TreeSearchRequest {
            initial_state: SearchState::from_snapshot(snapshot, &context.timeframe, targets),
            policy: CandidatePolicy::from_candidate(candidate),
        };
        let limit = self.config.analysis.tree_search_timeout();
        match tokio::time::timeout(limit, self.tree_search.search(&request)).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(ForgeError::TreeSearch(e.to_string())),
            Err(_) => Err(ForgeError::TreeSearch(format!("timed out after {:?}", limit))),
        }
    }
}

async fn performance_of(
    evaluator: &CandidateEvaluator,
    candidate: &Candidate,
    context: &MarketContext,
) -> Option<PerformanceMetrics> {
    match evaluator.calculate_performance_metrics(candidate, context).await {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!("Performance metrics unavailable for {}: {}", candidate.id, e);
            None
        }
    }
}

fn summarize(
    snapshot: &MarketSnapshot,
    verification: &VerificationResult,
    performance: Option<&PerformanceMetrics>,
    tree_search: &TreeSearchOutcome,
) -> String {
    let mut lines = vec![
        format!("Assets: {}", snapshot.symbols.join(", ")),
        format!("Market regime: {}, headline sentiment {:.2}", snapshot.regime, snapshot.sentiment),
        format!("Algorithm: {}", verification.candidate.description),
        format!(
            "Verification: score {:.2}, valid {}, converged {} after {} iterations",
            verification.score, verification.is_valid, verification.converged, verification.iterations
        ),
    ];
    if let Some(p) = performance {
        lines.push(format!(
            "Backtest: return {:.4}, risk {:.4}, sharpe-like {:.2}, max drawdown {:.4}",
            p.returns, p.risk, p.sharpe_like_ratio, p.max_drawdown
        ));
    }
    lines.push(format!(
        "Forward search: expected return {:.4}, risk {:.2}, interval [{:.4}, {:.4}]",
        tree_search.expected_return,
        tree_search.risk_assessment,
        tree_search.confidence_interval.0,
        tree_search.confidence_interval.1
    ));
    for f in verification.feedback.iter().filter(|f| !f.is_valid) {
        lines.push(format!("{} ({}): {}", f.critic, f.severity, f.feedback));
    }
    lines.join("\n")
}
