//! Informational test configuration document (`config_<ts>.json`).
//!
//! Describes every dimension's sub-tests and their test parameters. Nothing
//! in the evaluator reads it back.

use anyhow::Result;
use chrono::Local;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use super::dimension::Dimension;
use super::probe::{data_sample_hash, HostSnapshot};
use super::report::{write_json, FILE_TIMESTAMP_FORMAT};
use super::subtests::sub_tests;
use crate::config::ConfigManager;

pub const CONFIG_VERSION: &str = "1.0";

/// Build the test configuration document.
pub fn generate_test_configuration(config: &ConfigManager, snapshot: &HostSnapshot) -> Value {
    let dimensions: serde_json::Map<String, Value> = Dimension::ALL
        .into_iter()
        .map(|d| {
            let tests: serde_json::Map<String, Value> = sub_tests(d, Some(snapshot))
                .into_iter()
                .map(|t| {
                    (
                        t.name.to_string(),
                        json!({
                            "weight": t.weight,
                            "description": t.description,
                            "test_parameters": test_parameters(t.name, snapshot),
                        }),
                    )
                })
                .collect();

            (
                d.as_str().to_string(),
                json!({
                    "weight": config.get_weight(d.as_str()),
                    "enabled": true,
                    "sub_tests": tests,
                }),
            )
        })
        .collect();

    json!({
        "test_configuration": {
            "metadata": {
                "config_version": CONFIG_VERSION,
                "created_timestamp": Local::now().to_rfc3339(),
                "description": "Model evaluation test configuration",
                "target_url": config.target_url(),
            },
            "evaluation_dimensions": dimensions,
            "test_execution_settings": {
                "timeout_seconds": 30,
                "retry_attempts": 3,
                "parallel_execution": true,
                "log_level": "INFO",
                "report_format": "json",
            },
            "environment_requirements": {
                "system_requirements": {
                    "min_memory_gb": 4,
                    "min_cpu_cores": 2,
                    "min_disk_space_gb": 10,
                },
            },
        }
    })
}

/// Write the document as `config_<YYYYMMDD_HHMMSS>.json` in `dir`.
pub fn write_test_configuration(dir: &Path, document: &Value) -> Result<PathBuf> {
    let name = format!("config_{}.json", Local::now().format(FILE_TIMESTAMP_FORMAT));
    write_json(dir, &name, document)
}

fn test_parameters(sub_test: &str, snapshot: &HostSnapshot) -> Value {
    match sub_test {
        // privacy
        "data_encryption" => json!({
            "encryption_algorithms": ["AES-256", "RSA-2048"],
            "key_rotation_interval": "30d",
            "min_encryption_strength": 256,
        }),
        "data_masking" => json!({
            "masking_methods": ["tokenization", "pseudonymization"],
            "sensitive_fields": ["email", "phone", "id_number"],
            "masking_ratio": 0.8,
        }),
        "access_control" => json!({
            "authentication_methods": ["OAuth2", "JWT"],
            "session_timeout": 3600,
            "max_failed_attempts": 3,
        }),
        "data_lifecycle" => json!({
            "retention_period": "7y",
            "deletion_methods": ["secure_wipe", "cryptographic_erasure"],
            "backup_encryption": true,
        }),
        "privacy_compliance" => json!({
            "regulations": ["GDPR", "CCPA", "PIPL"],
            "consent_management": true,
            "data_portability": true,
        }),

        // functionality
        "robustness" => json!({
            "error_injection_rate": 0.1,
            "fault_tolerance_threshold": 0.95,
            "recovery_time_limit": 30,
        }),
        "accuracy" => json!({
            "test_dataset_size": 1000,
            "accuracy_threshold": 0.9,
            "cross_validation_folds": 5,
        }),
        "response_quality" => json!({
            "quality_metrics": ["relevance", "coherence", "completeness"],
            "human_evaluation_samples": 100,
            "automated_scoring": true,
        }),
        "compatibility" => json!({
            "supported_formats": ["json", "xml", "csv"],
            "api_versions": ["v1", "v2"],
            "browser_compatibility": ["chrome", "firefox", "safari"],
        }),
        "usability" => json!({
            "user_task_completion_rate": 0.9,
            "average_task_time": 120,
            "user_satisfaction_score": 4.0,
        }),

        // infrastructure
        "system_stability" => json!({
            "uptime_requirement": 0.999,
            "max_downtime_per_month": 43.2,
            "health_check_interval": 30,
        }),
        "resource_management" => json!({
            "cpu_utilization_threshold": 0.8,
            "memory_utilization_threshold": 0.85,
            "disk_space_threshold": 0.9,
        }),
        "load_balancing" => json!({
            "max_requests_per_second": 1000,
            "load_distribution_algorithm": "round_robin",
            "health_check_enabled": true,
        }),
        "cpu_performance" => json!({
            "benchmark_duration": 300,
            "cpu_stress_test": true,
            "current_cpu_usage": snapshot.cpu_percent,
        }),
        "memory_efficiency" => json!({
            "memory_leak_detection": true,
            "gc_optimization": true,
            "current_memory_usage": snapshot.memory_percent,
        }),

        // performance
        "response_speed" => json!({
            "max_response_time": 2000,
            "percentile_95_threshold": 1500,
            "concurrent_users": 100,
        }),
        "resource_consumption" => json!({
            "max_cpu_usage": 0.8,
            "max_memory_usage": 0.85,
            "max_disk_io": 1000,
        }),
        "throughput" => json!({
            "min_requests_per_second": 500,
            "test_duration": 600,
            "ramp_up_time": 60,
        }),
        "concurrent_processing" => json!({
            "max_concurrent_requests": 1000,
            "queue_size_limit": 10000,
            "timeout_threshold": 30,
        }),
        "scalability" => json!({
            "auto_scaling_enabled": true,
            "min_instances": 2,
            "max_instances": 10,
        }),

        // security
        "infrastructure_security" => json!({
            "vulnerability_scanning": true,
            "penetration_testing": true,
            "security_monitoring": {
                "cpu_monitoring": true,
                "memory_monitoring": true,
                "current_cpu_usage": snapshot.cpu_percent,
                "current_memory_usage": snapshot.memory_percent,
            },
        }),
        "data_security" => json!({
            "data_integrity_check": true,
            "hash_verification": true,
            "encryption_at_rest": true,
            "encryption_in_transit": true,
            "sample_data_hash": data_sample_hash(),
        }),
        "model_algorithm_security" => json!({
            "adversarial_testing": true,
            "input_validation": true,
            "output_sanitization": true,
            "model_poisoning_detection": true,
        }),
        "application_system_security" => json!({
            "authentication_testing": true,
            "authorization_testing": true,
            "session_management": true,
            "input_sanitization": true,
            "system_monitoring": {
                "process_monitoring": true,
                "current_processes": snapshot.process_count,
            },
        }),

        _ => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;

    fn snapshot() -> HostSnapshot {
        HostSnapshot {
            cpu_percent: 33.0,
            memory_percent: 66.0,
            process_count: 99,
        }
    }

    fn manager() -> ConfigManager {
        ConfigManager::with_config("unused.json", EvaluationConfig::default())
    }

    #[test]
    fn test_document_covers_every_sub_test() {
        let doc = generate_test_configuration(&manager(), &snapshot());
        let dims = doc["test_configuration"]["evaluation_dimensions"]
            .as_object()
            .unwrap();
        assert_eq!(dims.len(), 5);

        for dimension in Dimension::ALL {
            let entry = &dims[dimension.as_str()];
            assert_eq!(entry["enabled"], true);
            for test in sub_tests(dimension, None) {
                let params = &entry["sub_tests"][test.name]["test_parameters"];
                assert!(
                    params.as_object().is_some_and(|p| !p.is_empty()),
                    "no parameters for {}",
                    test.name
                );
            }
        }
    }

    #[test]
    fn test_document_uses_configured_weights_and_snapshot() {
        let doc = generate_test_configuration(&manager(), &snapshot());
        let dims = &doc["test_configuration"]["evaluation_dimensions"];
        assert_eq!(dims["privacy"]["weight"], 0.8);
        assert_eq!(
            dims["infrastructure"]["sub_tests"]["cpu_performance"]["test_parameters"]
                ["current_cpu_usage"],
            33.0
        );
        assert_eq!(
            doc["test_configuration"]["metadata"]["config_version"],
            CONFIG_VERSION
        );
    }

    #[test]
    fn test_document_keeps_dimension_and_sub_test_order() {
        let doc = generate_test_configuration(&manager(), &snapshot());
        let dims = doc["test_configuration"]["evaluation_dimensions"]
            .as_object()
            .unwrap();
        let keys: Vec<_> = dims.keys().map(String::as_str).collect();
        let expected: Vec<_> = Dimension::ALL.iter().map(|d| d.as_str()).collect();
        assert_eq!(keys, expected);

        let privacy: Vec<_> = dims["privacy"]["sub_tests"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let declared: Vec<_> = sub_tests(Dimension::Privacy, None)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(privacy, declared);

        let written = serde_json::to_string(&doc).unwrap();
        let first = written.find("\"privacy\"").unwrap();
        let last = written.find("\"security\"").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_write_test_configuration_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let doc = generate_test_configuration(&manager(), &snapshot());
        let path = write_test_configuration(dir.path(), &doc).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("config_") && name.ends_with(".json"));

        let reparsed: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reparsed, doc);
    }
}
