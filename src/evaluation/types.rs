use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::dimension::Dimension;

pub const MAX_SCORE: f64 = 100.0;
pub const EVALUATION_METHOD: &str = "weighted_average";

/// Score of one dimension in one run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub dimension: Dimension,
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
    pub weighted_score: f64,
    pub details: DimensionDetails,
    pub timestamp: DateTime<Utc>,
}

/// Sub-test breakdown stored with a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDetails {
    pub sub_tests: IndexMap<String, SubTestRecord>,
    pub dimension_weight: f64,
    pub evaluation_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_time_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTestRecord {
    pub score: f64,
    pub weight: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_items: Option<Map<String, Value>>,
}

/// A dimension that could not be evaluated in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionFailure {
    pub dimension: Dimension,
    pub error: String,
}
