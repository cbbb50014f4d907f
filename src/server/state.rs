use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::files::FileManager;
use crate::runner::EvaluatorCommand;

use super::pages::Pages;

/// Everything the dashboard needs to know at startup.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub config_path: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub evaluator: EvaluatorCommand,
}

/// Shared state for all handlers.
pub struct AppState {
    pub config_path: PathBuf,
    pub files: FileManager,
    pub evaluator: EvaluatorCommand,
    pub pages: Pages,
    /// Serializes read-modify-write cycles on the config file.
    pub config_lock: Mutex<()>,
}

impl AppState {
    pub fn new(settings: ServerSettings) -> anyhow::Result<Self> {
        Ok(Self {
            config_path: settings.config_path,
            files: FileManager::new(settings.source_dir, settings.target_dir),
            evaluator: settings.evaluator,
            pages: Pages::new()?,
            config_lock: Mutex::new(()),
        })
    }
}
