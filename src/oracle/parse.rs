use crate::types::Parameters;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Candidate proposal returned by the oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub code: String,
    pub description: String,
    pub parameters: Parameters,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("no JSON object found in response")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("schema violation: {0}")]
    Schema(String),
}

/// Strip markdown code fences around a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse the single JSON object contained in `text` into `T`.
///
/// Accepts a bare object, a fenced object, or an object surrounded by prose.
/// Anything that does not deserialize into `T` in full is rejected.
pub fn parse_object<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let body = strip_code_blocks(text);
    let start = body.find('{').ok_or(ParseError::NoJsonObject)?;
    let end = body.rfind('}').ok_or(ParseError::NoJsonObject)?;
    if end < start {
        return Err(ParseError::NoJsonObject);
    }

    let value: serde_json::Value = serde_json::from_str(&body[start..=end])
        .map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseError::Schema("expected a JSON object".to_string()));
    }

    serde_json::from_value(value).map_err(|e| ParseError::Schema(e.to_string()))
}

pub fn parse_suggestion(text: &str) -> Result<Suggestion, ParseError> {
    let suggestion: Suggestion = parse_object(text)?;
    if suggestion.code.trim().is_empty() {
        return Err(ParseError::Schema("code must not be empty".to_string()));
    }
    Ok(suggestion)
}
