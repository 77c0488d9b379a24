#![allow(dead_code)]

use algoforge::engines::analysis::{TreeSearchEvaluator, TreeSearchOutcome, TreeSearchRequest};
use algoforge::engines::evaluation::Backtest;
use algoforge::engines::validation::Critic;
use algoforge::oracle::{Oracle, OracleRequest};
use algoforge::types::{
    AssetSeries, BacktestOutcome, Candidate, CriticFeedback, MarketContext, Parameters, Severity,
};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Reply = Box<dyn Fn(usize, &OracleRequest) -> Result<String> + Send + Sync>;

/// Oracle double driven by a closure over the call number.
pub struct ScriptedOracle {
    reply: Reply,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(reply: impl Fn(usize, &OracleRequest) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_, _| Err(anyhow!("connection refused")))
    }

    /// Every call proposes a distinct momentum variant.
    pub fn evolving() -> Self {
        Self::new(|n, _| {
            Ok(json!({
                "code": format!("function strategy(context) {{ return variant{}(context); }}", n),
                "description": format!("Variant {}", n),
                "parameters": { "signal": "momentum", "exposure": 0.5 + (n % 10) as f64 * 0.1 }
            })
            .to_string())
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.reply)(n, request)
    }
}

/// Backtest double: return scales with `exposure`, code containing "crash"
/// fails to execute.
pub struct CountingBacktest {
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingBacktest {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backtest for CountingBacktest {
    async fn run(&self, candidate: &Candidate, _context: &MarketContext) -> Result<BacktestOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if candidate.code.contains("crash") {
            bail!("candidate crashed");
        }
        let exposure = candidate.param_f64("exposure").unwrap_or(0.5);
        let expected_return = 0.1 * exposure;
        let risk = 0.1;
        Ok(BacktestOutcome {
            expected_return,
            risk_assessment: risk,
            confidence_interval: (expected_return - 0.05, expected_return + 0.05),
            iterations: 10,
            equity_curve: vec![1.0, 1.0 + expected_return / 2.0, 1.0 + expected_return],
        })
    }
}

pub struct FixedTreeSearch {
    pub outcome: Option<TreeSearchOutcome>,
    pub delay: Option<Duration>,
}

impl FixedTreeSearch {
    pub fn returning(risk_assessment: f64) -> Self {
        Self {
            outcome: Some(TreeSearchOutcome {
                expected_return: 0.06,
                risk_assessment,
                confidence_interval: (0.01, 0.11),
                iterations: 100,
            }),
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self { outcome: None, delay: None }
    }
}

#[async_trait]
impl TreeSearchEvaluator for FixedTreeSearch {
    async fn search(&self, _request: &TreeSearchRequest) -> Result<TreeSearchOutcome> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone().ok_or_else(|| anyhow!("search tree exhausted"))
    }
}

/// Critic double returning the same verdict every time.
pub struct FixedCritic {
    pub name: &'static str,
    pub is_valid: bool,
    pub score: f64,
    pub severity: Severity,
}

impl FixedCritic {
    pub fn passing(name: &'static str) -> Self {
        Self { name, is_valid: true, score: 1.0, severity: Severity::Low }
    }

    pub fn failing(name: &'static str, score: f64, severity: Severity) -> Self {
        Self { name, is_valid: false, score, severity }
    }
}

impl Critic for FixedCritic {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "fixed verdict"
    }

    fn evaluate(&self, _candidate: &Candidate, _context: &MarketContext) -> Result<CriticFeedback> {
        Ok(CriticFeedback {
            critic: self.name.to_string(),
            is_valid: self.is_valid,
            score: self.score,
            severity: self.severity,
            feedback: if self.is_valid { "ok".to_string() } else { format!("{} found issues", self.name) },
            suggestions: if self.is_valid { Vec::new() } else { vec![format!("Fix {}", self.name)] },
        })
    }
}

pub fn params(value: serde_json::Value) -> Parameters {
    match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => Parameters::new(),
    }
}

pub fn candidate(code: &str, parameters: serde_json::Value) -> Candidate {
    Candidate::new(0, code, "test candidate", params(parameters))
}

pub fn sample_context() -> MarketContext {
    MarketContext {
        assets: vec![
            AssetSeries {
                symbol: "AAA".to_string(),
                prices: vec![100.0, 101.0, 102.5, 101.8, 103.0, 104.2, 105.0, 104.1],
                volumes: Vec::new(),
            },
            AssetSeries {
                symbol: "BBB".to_string(),
                prices: vec![50.0, 49.5, 50.2, 50.9, 50.1, 51.0, 51.6, 52.0],
                volumes: Vec::new(),
            },
        ],
        headlines: vec![
            "Tech stocks rally on strong earnings".to_string(),
            "Bond yields steady ahead of Fed meeting".to_string(),
        ],
        timeframe: "1d".to_string(),
    }
}
