//! Generative oracle: prompt in, `{code, description, parameters}` out.
//!
//! Transport lives behind the [`Oracle`] trait so tests and embedders can
//! supply their own; [`OracleClient`] adds the timeout, strict parsing and
//! fallback discipline every caller relies on.

pub mod client;
pub mod http;
pub mod parse;
pub mod prompts;

pub use client::{fallback_suggestion, FallbackReason, OracleClient, OracleOutcome};
pub use http::HttpOracle;
pub use parse::{parse_object, parse_suggestion, ParseError, Suggestion};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleRequestKind {
    Crossover,
    Mutation,
    Refinement,
    Analysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    pub prompt: String,
    pub kind: OracleRequestKind,
}

impl OracleRequest {
    pub fn new(kind: OracleRequestKind, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind,
        }
    }
}

/// Raw text generation transport
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, request: &OracleRequest) -> Result<String>;
}
