pub mod formatter;

pub use formatter::{
    format_report, format_results_table, format_score, should_use_colors,
};
