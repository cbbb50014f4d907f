use serde_json::{json, Map, Value};

use super::dimension::Dimension;
use super::probe::{data_sample_hash, HostSnapshot};

/// A named, weighted component of a dimension score.
#[derive(Debug, Clone, PartialEq)]
pub struct SubTest {
    pub name: &'static str,
    pub score: f64,
    pub weight: f64,
    pub description: &'static str,
    pub sub_items: Option<Map<String, Value>>,
}

impl SubTest {
    fn fixed(name: &'static str, score: f64, weight: f64, description: &'static str) -> Self {
        Self {
            name,
            score,
            weight,
            description,
            sub_items: None,
        }
    }

    fn with_sub_items(mut self, items: Value) -> Self {
        if let Value::Object(map) = items {
            self.sub_items = Some(map);
        }
        self
    }
}

/// Score derived from a usage percentage: the idle share, clamped to 0..=100.
pub fn headroom_score(usage_percent: f64) -> f64 {
    (100.0 - usage_percent).clamp(0.0, 100.0)
}

/// `Σ(score × weight)` over the sub-tests.
pub fn weighted_sum(sub_tests: &[SubTest]) -> f64 {
    sub_tests.iter().map(|t| t.score * t.weight).sum()
}

/// Sub-test table of a dimension.
///
/// Host-metric sub-tests score 0 when no snapshot is given.
pub fn sub_tests(dimension: Dimension, snapshot: Option<&HostSnapshot>) -> Vec<SubTest> {
    match dimension {
        Dimension::Privacy => vec![
            SubTest::fixed("data_encryption", 90.0, 0.3, "Data encryption strength"),
            SubTest::fixed("data_masking", 85.0, 0.25, "Data masking effectiveness"),
            SubTest::fixed("access_control", 80.0, 0.2, "Access control mechanisms"),
            SubTest::fixed("data_lifecycle", 85.0, 0.15, "Data lifecycle management"),
            SubTest::fixed("privacy_compliance", 88.0, 0.1, "Privacy regulation compliance"),
        ],
        Dimension::Functionality => vec![
            SubTest::fixed("robustness", 90.0, 0.35, "System robustness"),
            SubTest::fixed("accuracy", 85.0, 0.3, "Functional accuracy"),
            SubTest::fixed("response_quality", 89.0, 0.2, "Response quality"),
            SubTest::fixed("compatibility", 87.0, 0.1, "Compatibility"),
            SubTest::fixed("usability", 92.0, 0.05, "Usability"),
        ],
        Dimension::Infrastructure => {
            let cpu = snapshot.map(|s| headroom_score(s.cpu_percent)).unwrap_or(0.0);
            let memory = snapshot.map(|s| headroom_score(s.memory_percent)).unwrap_or(0.0);
            vec![
                SubTest::fixed("system_stability", 95.0, 0.3, "System stability"),
                SubTest::fixed("resource_management", 90.0, 0.25, "Resource management efficiency"),
                SubTest::fixed("load_balancing", 91.0, 0.2, "Load balancing"),
                SubTest::fixed("cpu_performance", cpu, 0.15, "CPU headroom"),
                SubTest::fixed("memory_efficiency", memory, 0.1, "Memory headroom"),
            ]
        }
        Dimension::Performance => vec![
            SubTest::fixed("response_speed", 85.0, 0.3, "Response speed"),
            SubTest::fixed("resource_consumption", 90.0, 0.25, "Resource consumption"),
            SubTest::fixed("throughput", 86.0, 0.2, "Throughput"),
            SubTest::fixed("concurrent_processing", 88.0, 0.15, "Concurrent processing capacity"),
            SubTest::fixed("scalability", 84.0, 0.1, "Scalability"),
        ],
        Dimension::Security => security_sub_tests(snapshot),
    }
}

fn security_sub_tests(snapshot: Option<&HostSnapshot>) -> Vec<SubTest> {
    let mut infrastructure =
        SubTest::fixed("infrastructure_security", 88.0, 0.25, "Infrastructure security");
    let data = SubTest::fixed("data_security", 90.0, 0.25, "Data security").with_sub_items(json!({
        "data_hash": data_sample_hash(),
        "encryption_status": true,
    }));
    let model = SubTest::fixed(
        "model_algorithm_security",
        89.0,
        0.25,
        "Model and algorithm security",
    )
    .with_sub_items(json!({ "input_safety": true }));
    let mut application = SubTest::fixed(
        "application_system_security",
        87.0,
        0.25,
        "Application system security",
    );

    if let Some(s) = snapshot {
        infrastructure = infrastructure.with_sub_items(json!({
            "cpu_monitoring": s.cpu_percent,
            "memory_monitoring": s.memory_percent,
        }));
        application = application.with_sub_items(json!({ "process_count": s.process_count }));
    }

    vec![infrastructure, data, model, application]
}
