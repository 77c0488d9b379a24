use crate::types::{Candidate, Parameters};
use rand::Rng;
use serde_json::{json, Value};

/// A named starting strategy
pub struct StrategyTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub code: &'static str,
    pub parameters: fn() -> Parameters,
}

fn params(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Parameters::new(),
    }
}

fn mean_reversion_parameters() -> Parameters {
    params(json!({
        "signal": "mean_reversion",
        "lookback": 20,
        "entryZ": 2.0,
        "riskBudget": 0.02,
        "maxPosition": 0.2,
        "exposure": 1.0
    }))
}

fn momentum_parameters() -> Parameters {
    params(json!({
        "signal": "momentum",
        "lookback": 60,
        "targetVolatility": 0.1,
        "maxPosition": 0.25,
        "exposure": 1.0
    }))
}

fn risk_parity_parameters() -> Parameters {
    params(json!({
        "signal": "hold",
        "lookback": 90,
        "rebalanceFrequency": "monthly",
        "exposure": 1.0
    }))
}

fn trend_following_parameters() -> Parameters {
    params(json!({
        "signal": "momentum",
        "fastPeriod": 10,
        "slowPeriod": 50,
        "maxPosition": 0.3,
        "exposure": 0.8
    }))
}

pub const TEMPLATES: &[StrategyTemplate] = &[
    StrategyTemplate {
        name: "mean_reversion",
        description: "Mean reversion on z-score of price against its rolling mean",
        code: "function strategy(context, params) {\n  const prices = context.prices;\n  const mean = rollingMean(prices, params.lookback);\n  const sd = rollingStd(prices, params.lookback);\n  const z = sd > 0 ? (last(prices) - mean) / sd : 0;\n  const volatility = sd / mean;\n  const positionSize = Math.min(params.maxPosition, params.riskBudget / Math.max(volatility, 1e-6));\n  return z > params.entryZ ? -positionSize : z < -params.entryZ ? positionSize : 0;\n}",
        parameters: mean_reversion_parameters,
    },
    StrategyTemplate {
        name: "momentum",
        description: "Time-series momentum following the sign of trailing returns",
        code: "function strategy(context, params) {\n  const returns = pctChange(context.prices);\n  const trend = sum(returns.slice(-params.lookback));\n  const volatility = std(returns.slice(-params.lookback));\n  const positionSize = Math.min(params.maxPosition, params.targetVolatility / Math.max(volatility, 1e-6));\n  return Math.sign(trend) * positionSize;\n}",
        parameters: momentum_parameters,
    },
    StrategyTemplate {
        name: "risk_parity",
        description: "Risk parity allocation weighting assets by inverse volatility",
        code: "function strategy(context, params) {\n  const vols = context.assets.map(a => std(pctChange(a.prices).slice(-params.lookback)));\n  const inverse = vols.map(v => 1 / Math.max(v, 1e-6));\n  const total = sum(inverse);\n  return inverse.map(w => w / total);\n}",
        parameters: risk_parity_parameters,
    },
    StrategyTemplate {
        name: "trend_following",
        description: "Moving-average crossover trend following",
        code: "function strategy(context, params) {\n  const fast = rollingMean(context.prices, params.fastPeriod);\n  const slow = rollingMean(context.prices, params.slowPeriod);\n  return fast > slow ? params.maxPosition : 0;\n}",
        parameters: trend_following_parameters,
    },
];

impl StrategyTemplate {
    pub fn instantiate(&self) -> Candidate {
        Candidate::new(0, self.code, self.description, (self.parameters)())
    }
}

fn jitter(value: &Value, rng: &mut impl Rng) -> Value {
    let factor = rng.gen_range(0.9..1.1);
    if let Some(i) = value.as_i64() {
        json!(((i as f64 * factor).round() as i64).max(1))
    } else if let Some(f) = value.as_f64() {
        json!(f * factor)
    } else {
        value.clone()
    }
}

/// Build `size` generation-0 candidates by cycling the templates. Copies after
/// the first pass get their numeric parameters jittered by up to 10%.
pub fn seed_population<R: Rng>(size: usize, rng: &mut R) -> Vec<Candidate> {
    (0..size)
        .map(|i| {
            let template = &TEMPLATES[i % TEMPLATES.len()];
            let mut candidate = template.instantiate();
            if i >= TEMPLATES.len() {
                candidate.parameters = candidate
                    .parameters
                    .iter()
                    .map(|(k, v)| (k.clone(), jitter(v, rng)))
                    .collect();
            }
            candidate
        })
        .collect()
}
