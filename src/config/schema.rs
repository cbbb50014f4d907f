use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::DEFAULT_TARGET_URL;

/// Evaluation configuration as stored in `evaluation_config.json`.
///
/// Example:
/// ```json
/// {
///   "evaluation_weights": { "privacy": { "weight": 0.8 } },
///   "test_configuration": { "target_url": "192.168.1.103:5011" },
///   "output_settings": { "generate_report": true }
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EvaluationConfig {
    /// Dimension name -> weight, in file order
    pub evaluation_weights: IndexMap<String, DimensionWeight>,

    pub test_configuration: TestConfiguration,

    pub output_settings: OutputSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DimensionWeight {
    #[serde(default)]
    pub weight: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DimensionWeight {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct TestConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OutputSettings {
    /// Write `evaluation_report_<ts>.json` at the end of a run (default: true)
    #[serde(default = "default_generate_report")]
    pub generate_report: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_generate_report() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            generate_report: true,
            extra: Map::new(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        let evaluation_weights = [
            ("privacy", 0.8),
            ("functionality", 0.7),
            ("infrastructure", 0.1),
            ("performance", 0.3),
            ("security", 0.2),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), DimensionWeight::new(weight)))
        .collect();

        Self {
            evaluation_weights,
            test_configuration: TestConfiguration {
                target_url: Some(DEFAULT_TARGET_URL.to_string()),
                extra: Map::new(),
            },
            output_settings: OutputSettings::default(),
        }
    }
}

impl EvaluationConfig {
    /// Sum of all configured dimension weights.
    pub fn total_weight(&self) -> f64 {
        self.evaluation_weights.values().map(|d| d.weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvaluationConfig::default();
        assert_eq!(config.evaluation_weights.len(), 5);
        assert_eq!(config.evaluation_weights["privacy"].weight, 0.8);
        assert_eq!(config.evaluation_weights["security"].weight, 0.2);
        assert_eq!(
            config.test_configuration.target_url.as_deref(),
            Some(DEFAULT_TARGET_URL)
        );
        assert!(config.output_settings.generate_report);
    }

    #[test]
    fn test_default_keeps_dimension_order() {
        let config = EvaluationConfig::default();
        let names: Vec<_> = config.evaluation_weights.keys().cloned().collect();
        assert_eq!(
            names,
            ["privacy", "functionality", "infrastructure", "performance", "security"]
        );
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let json = r#"{
            "evaluation_weights": { "privacy": { "weight": 0.5, "note": "tuned" } },
            "test_configuration": { "target_url": "10.0.0.1:80", "retries": 3 },
            "output_settings": { "generate_report": false, "format": "json" }
        }"#;
        let config: EvaluationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.evaluation_weights["privacy"].extra["note"], "tuned");
        assert!(!config.output_settings.generate_report);

        let reparsed: EvaluationConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(config, reparsed);
        assert_eq!(reparsed.test_configuration.extra["retries"], 3);
        assert_eq!(reparsed.output_settings.extra["format"], "json");
    }

    #[test]
    fn test_generate_report_defaults_to_true() {
        let json = r#"{
            "evaluation_weights": {},
            "test_configuration": {},
            "output_settings": {}
        }"#;
        let config: EvaluationConfig = serde_json::from_str(json).unwrap();
        assert!(config.output_settings.generate_report);
        assert!(config.test_configuration.target_url.is_none());
        assert_eq!(config.total_weight(), 0.0);
    }
}
