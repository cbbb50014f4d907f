use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::dimension::Dimension;
use super::probe::{data_sample_hash, HostProbe, HostSnapshot};
use super::subtests::{sub_tests, weighted_sum};
use super::types::{
    DimensionDetails, DimensionFailure, EvaluationResult, SubTestRecord, EVALUATION_METHOD,
    MAX_SCORE,
};
use crate::config::ConfigManager;

/// Score one dimension from its sub-test table.
///
/// `weight` is the configured dimension weight; `snapshot` feeds the
/// host-metric sub-tests and the `real_time_data` section.
pub fn evaluate_dimension(
    dimension: Dimension,
    weight: f64,
    snapshot: Option<&HostSnapshot>,
) -> EvaluationResult {
    let tests = sub_tests(dimension, snapshot);
    let score = weighted_sum(&tests);

    let sub_tests = tests
        .into_iter()
        .map(|t| {
            (
                t.name.to_string(),
                SubTestRecord {
                    score: t.score,
                    weight: t.weight,
                    description: t.description.to_string(),
                    sub_items: t.sub_items,
                },
            )
        })
        .collect();

    let real_time_data = snapshot.map(|s| match dimension {
        Dimension::Infrastructure => json!({
            "cpu_percent": s.cpu_percent,
            "memory_percent": s.memory_percent,
        }),
        Dimension::Security => json!({
            "infrastructure": {
                "cpu_percent": s.cpu_percent,
                "memory_percent": s.memory_percent,
            },
            "data_security": { "hash": data_sample_hash(), "encrypted": true },
            "application_system": { "processes": s.process_count },
        }),
        _ => json!(s),
    });

    EvaluationResult {
        dimension,
        score,
        max_score: MAX_SCORE,
        weight,
        weighted_score: score * weight,
        details: DimensionDetails {
            sub_tests,
            dimension_weight: weight,
            evaluation_method: EVALUATION_METHOD.to_string(),
            real_time_data,
        },
        timestamp: Utc::now(),
    }
}

/// Outcome of one full evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationRun {
    /// Successful results in `Dimension::ALL` order
    pub results: Vec<EvaluationResult>,
    pub failures: Vec<DimensionFailure>,
    pub duration: Duration,
}

/// Runs all dimensions concurrently and joins their results.
pub struct Evaluator {
    config: ConfigManager,
    probe: Arc<dyn HostProbe>,
    simulate_latency: bool,
}

impl Evaluator {
    pub fn new(config: ConfigManager, probe: Arc<dyn HostProbe>) -> Self {
        Self {
            config,
            probe,
            simulate_latency: true,
        }
    }

    /// Toggle the per-dimension artificial delay.
    pub fn simulate_latency(mut self, enabled: bool) -> Self {
        self.simulate_latency = enabled;
        self
    }

    /// Evaluate every dimension.
    ///
    /// A failing dimension is recorded in `failures` and does not abort the
    /// others. Fails only if no dimension could be evaluated.
    pub async fn run(&self) -> Result<EvaluationRun> {
        info!("starting evaluation run");
        let start = Instant::now();

        let outcomes =
            futures::future::join_all(Dimension::ALL.into_iter().map(|d| self.evaluate(d))).await;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (dimension, outcome) in Dimension::ALL.into_iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(%dimension, error = %format!("{:#}", e), "dimension evaluation failed");
                    failures.push(DimensionFailure {
                        dimension,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        if results.is_empty() {
            bail!("all {} dimensions failed to evaluate", failures.len());
        }

        let duration = start.elapsed();
        let total_weighted: f64 = results.iter().map(|r| r.weighted_score).sum();
        let total_weight: f64 = results.iter().map(|r| r.weight).sum();
        info!(
            total_weighted_score = total_weighted,
            total_weight,
            elapsed = ?duration,
            "evaluation run complete"
        );

        Ok(EvaluationRun {
            results,
            failures,
            duration,
        })
    }

    async fn evaluate(&self, dimension: Dimension) -> Result<EvaluationResult> {
        info!(%dimension, "evaluating dimension");
        if self.simulate_latency {
            tokio::time::sleep(dimension.simulated_latency()).await;
        }

        let snapshot = if dimension.uses_host_metrics() {
            let probe = Arc::clone(&self.probe);
            let snapshot = tokio::task::spawn_blocking(move || probe.snapshot())
                .await
                .context("host probe task panicked")?
                .context("failed to read host metrics")?;
            Some(snapshot)
        } else {
            None
        };

        let result = evaluate_dimension(
            dimension,
            self.config.get_weight(dimension.as_str()),
            snapshot.as_ref(),
        );
        info!(%dimension, score = result.score, "dimension evaluated");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DimensionWeight, EvaluationConfig};
    use crate::evaluation::probe::StaticProbe;

    const EPSILON: f64 = 1e-9;

    struct FailingProbe;

    impl HostProbe for FailingProbe {
        fn snapshot(&self) -> Result<HostSnapshot> {
            bail!("probe offline")
        }
    }

    fn snapshot() -> HostSnapshot {
        HostSnapshot {
            cpu_percent: 20.0,
            memory_percent: 50.0,
            process_count: 120,
        }
    }

    fn evaluator(config: EvaluationConfig, probe: Arc<dyn HostProbe>) -> Evaluator {
        Evaluator::new(ConfigManager::with_config("unused.json", config), probe)
            .simulate_latency(false)
    }

    #[test]
    fn test_functionality_weighted_score() {
        let result = evaluate_dimension(Dimension::Functionality, 0.7, None);
        assert!((result.score - 88.1).abs() < EPSILON);
        assert!((result.weighted_score - 88.1 * 0.7).abs() < EPSILON);
        assert_eq!(result.max_score, 100.0);
        assert_eq!(result.details.sub_tests.len(), 5);
        assert_eq!(result.details.dimension_weight, 0.7);
        assert!(result.details.real_time_data.is_none());
    }

    #[test]
    fn test_infrastructure_records_real_time_data() {
        let result = evaluate_dimension(Dimension::Infrastructure, 0.1, Some(&snapshot()));
        let data = result.details.real_time_data.unwrap();
        assert_eq!(data["cpu_percent"], 20.0);
        assert_eq!(data["memory_percent"], 50.0);
        assert_eq!(result.details.sub_tests["cpu_performance"].score, 80.0);
    }

    #[test]
    fn test_zero_weight_gives_zero_weighted_score() {
        let result = evaluate_dimension(Dimension::Privacy, 0.0, None);
        assert!(result.score > 0.0);
        assert_eq!(result.weighted_score, 0.0);
    }

    #[tokio::test]
    async fn test_run_collects_results_in_fixed_order() {
        let run = evaluator(EvaluationConfig::default(), Arc::new(StaticProbe(snapshot())))
            .run()
            .await
            .unwrap();

        let order: Vec<_> = run.results.iter().map(|r| r.dimension).collect();
        assert_eq!(order, Dimension::ALL);
        assert!(run.failures.is_empty());
        assert_eq!(run.results[0].weight, 0.8);
    }

    #[tokio::test]
    async fn test_run_missing_dimension_weight_is_zero() {
        let mut config = EvaluationConfig::default();
        config.evaluation_weights.shift_remove("security");
        config
            .evaluation_weights
            .insert("latency".to_string(), DimensionWeight::new(0.5));

        let run = evaluator(config, Arc::new(StaticProbe(snapshot())))
            .run()
            .await
            .unwrap();
        let security = run
            .results
            .iter()
            .find(|r| r.dimension == Dimension::Security)
            .unwrap();
        assert_eq!(security.weight, 0.0);
        assert_eq!(security.weighted_score, 0.0);
    }

    #[tokio::test]
    async fn test_probe_failure_is_isolated() {
        let run = evaluator(EvaluationConfig::default(), Arc::new(FailingProbe))
            .run()
            .await
            .unwrap();

        let evaluated: Vec<_> = run.results.iter().map(|r| r.dimension).collect();
        assert_eq!(evaluated, [Dimension::Privacy, Dimension::Functionality]);

        let failed: Vec<_> = run.failures.iter().map(|f| f.dimension).collect();
        assert_eq!(
            failed,
            [
                Dimension::Infrastructure,
                Dimension::Performance,
                Dimension::Security
            ]
        );
        assert!(run.failures[0].error.contains("probe offline"));
    }
}
