use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating or persisting the evaluation config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),

    #[error("invalid weight {0}: must be a finite, non-negative number")]
    InvalidWeight(f64),
}

/// Errors raised by the file manager. Every rejection variant leaves the
/// filesystem untouched.
#[derive(Debug, Error)]
pub enum FileOpError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid folder type '{0}'")]
    InvalidFolder(String),

    #[error("invalid file name '{0}'")]
    InvalidName(String),

    #[error("file {0} does not exist")]
    NotFound(String),

    #[error("file {0} already exists")]
    AlreadyExists(String),

    #[error("{0} is a directory and cannot be transferred")]
    IsDirectory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while running the evaluator subprocess.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("evaluator command is empty")]
    EmptyCommand,

    #[error("failed to start evaluator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("evaluator timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("I/O error while waiting for evaluator: {0}")]
    Io(#[from] std::io::Error),
}
