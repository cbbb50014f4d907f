//! JSON endpoints of the dashboard.

use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::{ConfigManager, DimensionWeight, EvaluationConfig};
use crate::error::{ConfigError, FileOpError, RunError};
use crate::evaluation::dimension::label_for;
use crate::files::{FileEntry, FileManager, Folder};
use crate::runner::run_evaluator;

use super::error::ApiError;
use super::state::AppState;

/// Display format of `last_updated` and run timestamps.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now_display() -> String {
    Local::now().format(DISPLAY_TIME_FORMAT).to_string()
}

// ── Views ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub original_name: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub weights: IndexMap<String, DimensionWeight>,
    pub pie_data: Vec<PieSlice>,
    pub total_weight: f64,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConfigView {
    /// Read the config at `path` the way the evaluator does: an invalid file
    /// falls back to the default weights, noted in `error`. Blocking.
    pub fn read(path: &Path) -> Self {
        let (manager, error) = match ConfigManager::open(path) {
            Ok(manager) => (manager, None),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid evaluation config, showing defaults");
                (
                    ConfigManager::with_config(path, EvaluationConfig::default()),
                    Some(e.to_string()),
                )
            }
        };

        let weights = manager.config().evaluation_weights.clone();
        let pie_data: Vec<PieSlice> = weights
            .iter()
            .map(|(name, dim)| PieSlice {
                name: label_for(name).to_string(),
                value: dim.weight,
                original_name: name.clone(),
            })
            .collect();
        let total_weight = pie_data.iter().map(|s| s.value).sum();

        Self {
            weights,
            pie_data,
            total_weight,
            last_updated: now_display(),
            error,
        }
    }

    pub async fn load(state: &Arc<AppState>) -> Result<Self, ApiError> {
        let path = state.config_path.clone();
        Ok(tokio::task::spawn_blocking(move || Self::read(&path)).await?)
    }
}

#[derive(Debug, Serialize)]
pub struct MonitorView {
    pub target_folder: String,
    pub source_folder: String,
    pub target_files: Vec<FileEntry>,
    pub source_files: Vec<FileEntry>,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MonitorView {
    /// Blocking.
    pub fn read(state: &AppState) -> Self {
        let files = &state.files;
        let mut errors = Vec::new();
        let mut list = |folder: Folder| {
            files.list(folder).unwrap_or_else(|e| {
                warn!(folder = ?folder, error = %e, "cannot list folder");
                errors.push(e.to_string());
                Vec::new()
            })
        };
        let target_files = list(Folder::Target);
        let source_files = list(Folder::Source);

        Self {
            target_folder: files.dir(Folder::Target).display().to_string(),
            source_folder: files.dir(Folder::Source).display().to_string(),
            target_files,
            source_files,
            last_updated: now_display(),
            error: (!errors.is_empty()).then(|| errors.join("; ")),
        }
    }

    pub async fn load(state: &Arc<AppState>) -> Result<Self, ApiError> {
        let state = Arc::clone(state);
        Ok(tokio::task::spawn_blocking(move || Self::read(&state)).await?)
    }
}

// ── Read endpoints ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn config(State(state): State<Arc<AppState>>) -> Result<Json<ConfigView>, ApiError> {
    Ok(Json(ConfigView::load(&state).await?))
}

pub async fn monitor(State(state): State<Arc<AppState>>) -> Result<Json<MonitorView>, ApiError> {
    Ok(Json(MonitorView::load(&state).await?))
}

// ── File operations ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    fn ok(message: String) -> Json<Self> {
        info!("{}", message);
        Json(Self {
            success: true,
            message,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FileOpError::MissingParameter(name).into()),
    }
}

/// Run a file operation on the blocking pool.
async fn with_files<F>(state: &Arc<AppState>, op: F) -> Result<(), ApiError>
where
    F: FnOnce(&FileManager) -> Result<(), FileOpError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(&state.files)).await??;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub folder_type: Option<String>,
    pub old_name: Option<String>,
    pub new_name: Option<String>,
}

pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(req) = body?;
    let folder = Folder::parse(&required(req.folder_type, "folder_type")?)?;
    let old_name = required(req.old_name, "old_name")?;
    let new_name = required(req.new_name, "new_name")?;

    let message = format!("renamed {} -> {}", old_name, new_name);
    with_files(&state, move |files| files.rename(folder, &old_name, &new_name)).await?;
    Ok(ActionResponse::ok(message))
}

#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub file_name: Option<String>,
}

pub async fn transfer_file(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(req) = body?;
    let name = required(req.file_name, "file_name")?;
    let message = format!("transferred {}", name);
    with_files(&state, move |files| files.transfer(&name)).await?;
    Ok(ActionResponse::ok(message))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    delete_in(&state, Folder::Target, body).await
}

pub async fn delete_source_file(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    delete_in(&state, Folder::Source, body).await
}

async fn delete_in(
    state: &Arc<AppState>,
    folder: Folder,
    body: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(req) = body?;
    let name = required(req.file_name, "file_name")?;
    let message = format!("deleted {}", name);
    with_files(state, move |files| files.delete(folder, &name)).await?;
    Ok(ActionResponse::ok(message))
}

// ── Evaluator and weights ─────────────────────────────────────────

pub async fn run_fusion_evaluator(State(state): State<Arc<AppState>>) -> Response {
    match run_evaluator(&state.evaluator).await {
        Ok(output) if output.success() => Json(json!({
            "success": true,
            "message": "evaluator finished successfully",
            "output": output.stdout,
            "timestamp": now_display(),
        }))
        .into_response(),
        Ok(output) => {
            let code = output
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none (terminated by signal)".to_string());
            warn!(exit_code = %code, "evaluator failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": format!("evaluator failed with exit code {}", code),
                    "stdout": output.stdout,
                    "stderr": output.stderr,
                })),
            )
                .into_response()
        }
        Err(err @ RunError::Timeout(_)) => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({
                "success": false,
                "kind": "timeout",
                "error": err.to_string(),
            })),
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "evaluator could not be run");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateWeightRequest {
    pub dimension: Option<String>,
    pub weight: Option<f64>,
}

pub async fn update_weight(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateWeightRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(req) = body?;
    let dimension = required(req.dimension, "dimension")?;
    let weight = req
        .weight
        .ok_or(ApiError::from(FileOpError::MissingParameter("weight")))?;

    let message = format!("weight updated: {} = {}", dimension, weight);
    let path = state.config_path.clone();
    let _guard = state.config_lock.lock().await;
    tokio::task::spawn_blocking(move || -> Result<(), ConfigError> {
        let mut manager = ConfigManager::open(path)?;
        manager.set_weight(&dimension, weight)
    })
    .await??;
    Ok(ActionResponse::ok(message))
}
