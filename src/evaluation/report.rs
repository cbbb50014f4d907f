use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::engine::EvaluationRun;
use super::types::{DimensionFailure, EvaluationResult};

pub const REPORT_TYPE: &str = "model_evaluation_summary";

/// Timestamp format used in generated file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: Summary,
    pub detailed_results: Vec<EvaluationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub report_type: String,
    pub generated_timestamp: DateTime<Local>,
    /// Run duration in seconds
    pub evaluation_duration: f64,
    pub target_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_dimensions: Vec<DimensionFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_dimensions: usize,
    pub total_weighted_score: f64,
    pub total_weight: f64,
    pub overall_score: f64,
}

impl Summary {
    /// `overall_score = Σweighted / Σweight`, or 0 when the weights sum to 0.
    pub fn from_results(results: &[EvaluationResult]) -> Self {
        let total_weighted_score: f64 = results.iter().map(|r| r.weighted_score).sum();
        let total_weight: f64 = results.iter().map(|r| r.weight).sum();
        let overall_score = if total_weight > 0.0 {
            total_weighted_score / total_weight
        } else {
            0.0
        };

        Self {
            total_dimensions: results.len(),
            total_weighted_score,
            total_weight,
            overall_score,
        }
    }
}

impl Report {
    pub fn from_run(run: EvaluationRun, target_url: &str) -> Self {
        Self {
            metadata: ReportMetadata {
                report_type: REPORT_TYPE.to_string(),
                generated_timestamp: Local::now(),
                evaluation_duration: run.duration.as_secs_f64(),
                target_url: target_url.to_string(),
                failed_dimensions: run.failures,
            },
            summary: Summary::from_results(&run.results),
            detailed_results: run.results,
        }
    }

    /// `evaluation_report_<YYYYMMDD_HHMMSS>.json`
    pub fn file_name(&self) -> String {
        format!(
            "evaluation_report_{}.json",
            self.metadata
                .generated_timestamp
                .format(FILE_TIMESTAMP_FORMAT)
        )
    }
}

/// Write the report into `dir` atomically and return its path.
pub fn write_report(dir: &Path, report: &Report) -> Result<PathBuf> {
    write_json(dir, &report.file_name(), report)
}

/// Load a report previously written with [`write_report`].
pub fn read_report(path: &Path) -> Result<Report> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open report at {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse report at {}", path.display()))
}

/// Pretty-print `value` to `dir/name` through an atomic rename.
pub(crate) fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory at {}", dir.display()))?;

    let path = dir.join(name);
    let mut file = AtomicWriteFile::open(&path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, value)
        .with_context(|| format!("Failed to serialize {}", name))?;
    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::dimension::Dimension;
    use crate::evaluation::engine::evaluate_dimension;
    use crate::evaluation::probe::HostSnapshot;
    use std::time::Duration;

    fn sample_run(weights: [f64; 5]) -> EvaluationRun {
        let snapshot = HostSnapshot {
            cpu_percent: 15.0,
            memory_percent: 45.0,
            process_count: 80,
        };
        let results = Dimension::ALL
            .into_iter()
            .zip(weights)
            .map(|(d, w)| evaluate_dimension(d, w, Some(&snapshot)))
            .collect();
        EvaluationRun {
            results,
            failures: Vec::new(),
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_summary_overall_score() {
        let run = sample_run([0.8, 0.7, 0.1, 0.3, 0.2]);
        let summary = Summary::from_results(&run.results);

        let weighted: f64 = run.results.iter().map(|r| r.score * r.weight).sum();
        assert_eq!(summary.total_dimensions, 5);
        assert!((summary.total_weight - 2.1).abs() < 1e-9);
        assert!((summary.overall_score - weighted / 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_summary_zero_weights() {
        let run = sample_run([0.0; 5]);
        let summary = Summary::from_results(&run.results);
        assert_eq!(summary.total_weight, 0.0);
        assert_eq!(summary.overall_score, 0.0);
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_results(&[]);
        assert_eq!(summary.total_dimensions, 0);
        assert_eq!(summary.overall_score, 0.0);
    }

    #[test]
    fn test_file_name_format() {
        let report = Report::from_run(sample_run([0.2; 5]), "host:1");
        let name = report.file_name();
        assert!(name.starts_with("evaluation_report_"));
        assert!(name.ends_with(".json"));
        // evaluation_report_ + YYYYMMDD_HHMMSS + .json
        assert_eq!(name.len(), "evaluation_report_".len() + 15 + ".json".len());
    }

    #[test]
    fn test_write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::from_run(sample_run([0.8, 0.7, 0.1, 0.3, 0.2]), "10.0.0.1:5011");

        let path = write_report(dir.path(), &report).unwrap();
        assert!(path.exists());

        let loaded = read_report(&path).unwrap();
        assert_eq!(loaded.summary.overall_score, report.summary.overall_score);
        assert_eq!(loaded.detailed_results.len(), 5);
        assert_eq!(loaded.metadata.report_type, REPORT_TYPE);
        assert!(loaded.metadata.failed_dimensions.is_empty());
    }

    #[test]
    fn test_failed_dimensions_serialized_only_when_present() {
        let mut run = sample_run([0.5; 5]);
        let report = Report::from_run(run.clone(), "t");
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["metadata"].get("failed_dimensions").is_none());

        run.failures.push(DimensionFailure {
            dimension: Dimension::Security,
            error: "probe offline".to_string(),
        });
        let json = serde_json::to_value(Report::from_run(run, "t")).unwrap();
        assert_eq!(json["metadata"]["failed_dimensions"][0]["dimension"], "security");
    }
}
