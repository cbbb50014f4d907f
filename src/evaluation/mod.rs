pub mod dimension;
pub mod engine;
pub mod probe;
pub mod report;
pub mod subtests;
pub mod test_config;
pub mod types;

pub use dimension::Dimension;
pub use engine::{evaluate_dimension, EvaluationRun, Evaluator};
pub use probe::{HostProbe, HostSnapshot, StaticProbe, SystemProbe};
pub use report::{read_report, write_report, Report, Summary};
pub use test_config::{generate_test_configuration, write_test_configuration};
pub use types::{DimensionDetails, DimensionFailure, EvaluationResult, SubTestRecord};
