use crate::engines::metrics::RiskMetrics;
use crate::error::{ForgeError, Result};
use crate::types::MarketContext;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

const VOLATILE_THRESHOLD: f64 = 0.03;
const TREND_THRESHOLD: f64 = 0.001;

const POSITIVE_WORDS: &[&str] = &[
    "gain", "growth", "beat", "bullish", "rally", "upgrade", "record", "strong", "surge", "optimis",
];
const NEGATIVE_WORDS: &[&str] = &[
    "loss", "decline", "miss", "bearish", "selloff", "downgrade", "weak", "plunge", "recession", "pessimis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRegime {
    Bull,
    Bear,
    Volatile,
    Sideways,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketRegime::Bull => "bull",
            MarketRegime::Bear => "bear",
            MarketRegime::Volatile => "volatile",
            MarketRegime::Sideways => "sideways",
        };
        f.write_str(s)
    }
}

/// Per-period risk statistics for one asset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub volatility: f64,
    pub max_drawdown: f64,
    pub mean_return: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub symbols: Vec<String>,
    /// Prices divided by the first observation
    pub normalized: BTreeMap<String, Vec<f64>>,
    pub risk: BTreeMap<String, RiskProfile>,
    /// In [-1, 1]
    pub sentiment: f64,
    pub regime: MarketRegime,
    /// Pearson correlation of returns, indexed like `symbols`
    pub correlation: Vec<Vec<f64>>,
}

fn validate(context: &MarketContext) -> Result<()> {
    if context.assets.is_empty() {
        return Err(ForgeError::Preprocessing("market context has no assets".to_string()));
    }

    let mut seen = HashSet::new();
    for asset in &context.assets {
        if !seen.insert(asset.symbol.as_str()) {
            return Err(ForgeError::Preprocessing(format!(
                "duplicate asset symbol: {}",
                asset.symbol
            )));
        }
        if asset.prices.len() < 2 {
            return Err(ForgeError::Preprocessing(format!(
                "asset {} needs at least 2 prices, got {}",
                asset.symbol,
                asset.prices.len()
            )));
        }
        if let Some((i, p)) = asset
            .prices
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(ForgeError::Preprocessing(format!(
                "asset {} has invalid price {} at index {}",
                asset.symbol, p, i
            )));
        }
    }
    Ok(())
}

/// Headline sentiment in [-1, 1] from keyword counts.
pub fn sentiment_score(headlines: &[String]) -> f64 {
    let mut positive = 0usize;
    let mut negative = 0usize;
    for headline in headlines {
        let lower = headline.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()) {
            if POSITIVE_WORDS.iter().any(|w| token.starts_with(w)) {
                positive += 1;
            } else if NEGATIVE_WORDS.iter().any(|w| token.starts_with(w)) {
                negative += 1;
            }
        }
    }
    let total = positive + negative;
    if total == 0 {
        return 0.0;
    }
    (positive as f64 - negative as f64) / total as f64
}

pub fn classify_regime(profiles: &[RiskProfile]) -> MarketRegime {
    let mean_return = RiskMetrics::mean(&profiles.iter().map(|p| p.mean_return).collect::<Vec<_>>());
    let mean_volatility = RiskMetrics::mean(&profiles.iter().map(|p| p.volatility).collect::<Vec<_>>());

    if mean_volatility > VOLATILE_THRESHOLD {
        MarketRegime::Volatile
    } else if mean_return > TREND_THRESHOLD {
        MarketRegime::Bull
    } else if mean_return < -TREND_THRESHOLD {
        MarketRegime::Bear
    } else {
        MarketRegime::Sideways
    }
}

/// Normalise prices and derive risk, sentiment, regime and correlations.
pub fn preprocess(context: &MarketContext) -> Result<MarketSnapshot> {
    validate(context)?;

    let returns: Vec<Vec<f64>> = context
        .assets
        .par_iter()
        .map(|a| RiskMetrics::calculate_returns(&a.prices))
        .collect();

    let profiles: Vec<RiskProfile> = context
        .assets
        .par_iter()
        .zip(returns.par_iter())
        .map(|(asset, r)| RiskProfile {
            volatility: RiskMetrics::std_dev(r),
            max_drawdown: RiskMetrics::max_drawdown(&asset.prices),
            mean_return: RiskMetrics::mean(r),
        })
        .collect();

    let n = returns.len();
    let correlation: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        1.0
                    } else {
                        RiskMetrics::correlation(&returns[i], &returns[j])
                    }
                })
                .collect()
        })
        .collect();

    let normalized = context
        .assets
        .iter()
        .map(|a| {
            let base = a.prices[0];
            (a.symbol.clone(), a.prices.iter().map(|p| p / base).collect())
        })
        .collect();

    let risk = context
        .assets
        .iter()
        .zip(&profiles)
        .map(|(a, p)| (a.symbol.clone(), *p))
        .collect();

    Ok(MarketSnapshot {
        symbols: context.assets.iter().map(|a| a.symbol.clone()).collect(),
        normalized,
        risk,
        sentiment: sentiment_score(&context.headlines),
        regime: classify_regime(&profiles),
        correlation,
    })
}
