use super::parse::{parse_object, parse_suggestion, ParseError, Suggestion};
use super::{Oracle, OracleRequest, OracleRequestKind};
use crate::types::Parameters;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const FALLBACK_CODE: &str = "function strategy(context) {\n  // conservative no-op: keep current allocation, open no new positions\n  return { action: 'hold', positionSize: 0 };\n}";
pub const FALLBACK_DESCRIPTION: &str = "Fallback conservative algorithm";

/// The fixed candidate substituted whenever the oracle cannot be used.
pub fn fallback_suggestion() -> Suggestion {
    let mut parameters = Parameters::new();
    parameters.insert("conservativeMode".to_string(), serde_json::Value::Bool(true));
    Suggestion {
        code: FALLBACK_CODE.to_string(),
        description: FALLBACK_DESCRIPTION.to_string(),
        parameters,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// The transport failed before a response arrived
    Transport(String),
    Timeout,
    /// A response arrived but did not contain a valid suggestion
    Malformed(ParseError),
}

impl FallbackReason {
    /// True when the oracle never produced a response at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, FallbackReason::Transport(_) | FallbackReason::Timeout)
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Transport(e) => write!(f, "transport failure: {}", e),
            FallbackReason::Timeout => f.write_str("timed out"),
            FallbackReason::Malformed(e) => write!(f, "malformed response: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleOutcome {
    Parsed(Suggestion),
    Fallback {
        suggestion: Suggestion,
        reason: FallbackReason,
    },
}

impl OracleOutcome {
    pub fn suggestion(&self) -> &Suggestion {
        match self {
            OracleOutcome::Parsed(s) => s,
            OracleOutcome::Fallback { suggestion, .. } => suggestion,
        }
    }

    pub fn into_suggestion(self) -> Suggestion {
        match self {
            OracleOutcome::Parsed(s) => s,
            OracleOutcome::Fallback { suggestion, .. } => suggestion,
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            OracleOutcome::Parsed(_) => None,
            OracleOutcome::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback_reason().is_some()
    }
}

/// Time-bounded oracle access with strict parsing. Never returns an error:
/// every failure becomes an explicit fallback.
#[derive(Clone)]
pub struct OracleClient {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl OracleClient {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    async fn raw(&self, request: &OracleRequest) -> Result<String, FallbackReason> {
        debug!("Oracle {:?} request ({} chars)", request.kind, request.prompt.len());
        match tokio::time::timeout(self.timeout, self.oracle.complete(request)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(FallbackReason::Transport(e.to_string())),
            Err(_) => Err(FallbackReason::Timeout),
        }
    }

    /// Ask for a candidate proposal.
    pub async fn suggest(&self, kind: OracleRequestKind, prompt: String) -> OracleOutcome {
        let request = OracleRequest::new(kind, prompt);
        let parsed = match self.raw(&request).await {
            Ok(text) => parse_suggestion(&text).map_err(FallbackReason::Malformed),
            Err(reason) => Err(reason),
        };

        match parsed {
            Ok(suggestion) => OracleOutcome::Parsed(suggestion),
            Err(reason) => {
                warn!("Oracle {:?} request fell back: {}", kind, reason);
                OracleOutcome::Fallback {
                    suggestion: fallback_suggestion(),
                    reason,
                }
            }
        }
    }

    /// Ask for an arbitrary JSON document; the caller chooses its own fallback.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        kind: OracleRequestKind,
        prompt: String,
    ) -> Result<T, FallbackReason> {
        let request = OracleRequest::new(kind, prompt);
        let text = self.raw(&request).await?;
        parse_object(&text).map_err(FallbackReason::Malformed)
    }
}
