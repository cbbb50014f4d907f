mod schema;

pub use schema::{DimensionWeight, EvaluationConfig, OutputSettings, TestConfiguration};

use atomic_write_file::AtomicWriteFile;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::error::ConfigError;

/// File name of the evaluation config inside the output directory
pub const CONFIG_FILE_NAME: &str = "evaluation_config.json";

/// Target used when the config does not name one
pub const DEFAULT_TARGET_URL: &str = "192.168.1.103:5011";

/// Allowed distance of the weight sum from 1.0 before a warning is raised
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

const REQUIRED_KEYS: [&str; 3] = ["evaluation_weights", "test_configuration", "output_settings"];

/// A config document that passed validation, with any soft warnings.
#[derive(Debug)]
pub struct Validated {
    pub config: EvaluationConfig,
    pub warnings: Vec<String>,
}

/// Validate a raw config document.
///
/// Missing top-level keys are hard errors. A weight sum outside
/// `1.0 ± WEIGHT_SUM_TOLERANCE` only produces a warning.
pub fn validate(document: &Value) -> Result<Validated, ConfigError> {
    for key in REQUIRED_KEYS {
        if document.get(key).is_none() {
            return Err(ConfigError::MissingKey(key));
        }
    }

    let config: EvaluationConfig = serde_json::from_value(document.clone())?;
    let warnings = weight_sum_warning(&config).into_iter().collect();

    Ok(Validated { config, warnings })
}

fn weight_sum_warning(config: &EvaluationConfig) -> Option<String> {
    let total = config.total_weight();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        Some(format!("dimension weights sum to {:.3}, expected 1.0", total))
    } else {
        None
    }
}

/// Loads, queries and persists the evaluation config.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: EvaluationConfig,
}

impl ConfigManager {
    /// Load the config at `path`.
    ///
    /// Never fails: a missing file silently yields the default config, and an
    /// unreadable or invalid file is logged and also yields the default.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match read_config(&path) {
            Ok(Some(config)) => {
                info!(path = %path.display(), "loaded evaluation config");
                config
            }
            Ok(None) => {
                debug!(path = %path.display(), "no evaluation config found, using defaults");
                EvaluationConfig::default()
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "invalid evaluation config, using defaults");
                EvaluationConfig::default()
            }
        };
        Self { path, config }
    }

    /// Load the config at `path` for modification.
    ///
    /// Like [`ConfigManager::load`] a missing file yields the default config,
    /// but an invalid file is an error so that saving cannot clobber it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = read_config(&path)?.unwrap_or_default();
        Ok(Self { path, config })
    }

    /// Wrap an in-memory config that will be saved to `path`.
    pub fn with_config(path: impl Into<PathBuf>, config: EvaluationConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Configured weight of `dimension`, or 0.0 when absent.
    pub fn get_weight(&self, dimension: &str) -> f64 {
        self.config
            .evaluation_weights
            .get(dimension)
            .map(|d| d.weight)
            .unwrap_or(0.0)
    }

    pub fn target_url(&self) -> &str {
        self.config
            .test_configuration
            .target_url
            .as_deref()
            .unwrap_or(DEFAULT_TARGET_URL)
    }

    pub fn generate_report(&self) -> bool {
        self.config.output_settings.generate_report
    }

    /// Override the weight of an existing dimension and persist the config.
    pub fn set_weight(&mut self, dimension: &str, weight: f64) -> Result<(), ConfigError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::InvalidWeight(weight));
        }

        let entry = self
            .config
            .evaluation_weights
            .get_mut(dimension)
            .ok_or_else(|| ConfigError::UnknownDimension(dimension.to_string()))?;
        let previous = entry.weight;
        entry.weight = weight;

        if let Err(e) = self.save() {
            if let Some(entry) = self.config.evaluation_weights.get_mut(dimension) {
                entry.weight = previous;
            }
            return Err(e);
        }

        info!(dimension, weight, "updated dimension weight");
        if let Some(warning) = weight_sum_warning(&self.config) {
            warn!("{}", warning);
        }
        Ok(())
    }

    /// Write the config to its path atomically, creating the parent directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = AtomicWriteFile::open(&self.path).map_err(io_err)?;
        serde_json::to_writer_pretty(&mut file, &self.config)?;
        file.commit().map_err(io_err)?;
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<Option<EvaluationConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let document: Value = serde_json::from_str(&content)?;
    let validated = validate(&document)?;
    for warning in &validated.warnings {
        warn!(path = %path.display(), "{}", warning);
    }
    Ok(Some(validated.config))
}
