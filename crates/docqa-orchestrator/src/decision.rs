use serde_json::Value;

use docqa_core::types::Decision;

pub const PARSE_FALLBACK_REASONING: &str = "Defaulting to retrieval due to response parsing error";
pub const ERROR_FALLBACK_REASONING: &str = "Error in decision making, defaulting to retrieval";

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionParse {
    Ok(Decision),
    /// Not JSON at all.
    ParseError(String),
    /// JSON, but not a `Decision`.
    SchemaError(String),
}

pub fn parse_decision(raw: &str) -> DecisionParse {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(e) => return DecisionParse::ParseError(e.to_string()),
    };
    match serde_json::from_value::<Decision>(value) {
        Ok(decision) => DecisionParse::Ok(decision),
        Err(e) => DecisionParse::SchemaError(e.to_string()),
    }
}

impl DecisionParse {
    /// Collapse to a usable decision; anything malformed becomes the
    /// retrieve-with-the-original-query fallback.
    pub fn into_decision(self, query: &str) -> Decision {
        match self {
            DecisionParse::Ok(decision) => decision,
            DecisionParse::ParseError(e) | DecisionParse::SchemaError(e) => {
                tracing::warn!(error = %e, "invalid decision response, falling back to retrieval");
                Decision::fallback(query, PARSE_FALLBACK_REASONING)
            }
        }
    }
}
