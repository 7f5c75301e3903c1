use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One user interaction's worth of input. Never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub trigger: String,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub script: String,
    pub payload: String,
}
