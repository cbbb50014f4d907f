use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::evaluation::Report;
use crate::evaluation::types::{DimensionFailure, EvaluationResult};

/// Scores at or above this are shown green
const GOOD_SCORE: f64 = 85.0;
/// Scores below this are shown red
const POOR_SCORE: f64 = 60.0;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with one decimal, e.g. "86.8"
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

fn colored_score(score: f64, width: usize, use_colors: bool) -> String {
    let text = format!("{:>width$}", format_score(score), width = width);
    if !use_colors {
        text
    } else if score >= GOOD_SCORE {
        text.green().to_string()
    } else if score >= POOR_SCORE {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

/// Format per-dimension results as a table:
/// Dimension, Score, Weight, Weighted
pub fn format_results_table(results: &[EvaluationResult], use_colors: bool) -> String {
    if results.is_empty() {
        return "No dimensions evaluated.".to_string();
    }

    let name_width = results
        .iter()
        .map(|r| r.dimension.label().chars().count())
        .max()
        .unwrap_or(0)
        .max("Dimension".len());

    let header = format!(
        "{:<name_width$}  {:>6}  {:>6}  {:>8}",
        "Dimension",
        "Score",
        "Weight",
        "Weighted",
        name_width = name_width
    );

    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for result in results {
        lines.push(format!(
            "{:<name_width$}  {}  {:>6.2}  {:>8.2}",
            result.dimension.label(),
            colored_score(result.score, 6, use_colors),
            result.weight,
            result.weighted_score,
            name_width = name_width
        ));
    }

    lines.join("\n")
}

fn format_failures(failures: &[DimensionFailure], use_colors: bool) -> Vec<String> {
    failures
        .iter()
        .map(|f| {
            let line = format!("{} failed: {}", f.dimension.label(), f.error);
            if use_colors {
                line.red().to_string()
            } else {
                line
            }
        })
        .collect()
}

/// Format a whole report: results table, failures and the overall score.
pub fn format_report(report: &Report, use_colors: bool) -> String {
    let mut lines = vec![format_results_table(&report.detailed_results, use_colors)];
    lines.extend(format_failures(&report.metadata.failed_dimensions, use_colors));
    lines.push(String::new());

    let label = if use_colors {
        "Overall score".bold().to_string()
    } else {
        "Overall score".to_string()
    };
    lines.push(format!(
        "{}: {} (target {}, {:.1}s)",
        label,
        colored_score(report.summary.overall_score, 0, use_colors),
        report.metadata.target_url,
        report.metadata.evaluation_duration
    ));

    lines.join("\n")
}
