//! HTML pages rendered with minijinja.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::Environment;
use serde::Serialize;
use tracing::error;

use super::api::{ConfigView, MonitorView};
use super::state::AppState;

const INDEX: &str = "index.html";
const MONITOR: &str = "monitor.html";

/// Page templates compiled into the binary.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(INDEX, include_str!("../../templates/index.html"))?;
        env.add_template(MONITOR, include_str!("../../templates/monitor.html"))?;
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }

    fn respond<S: Serialize>(&self, name: &str, ctx: S) -> Response {
        match self.render(name, ctx) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!(template = name, error = %e, "page render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "page render failed").into_response()
            }
        }
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    match ConfigView::load(&state).await {
        Ok(view) => state.pages.respond(INDEX, view),
        Err(e) => e.into_response(),
    }
}

pub async fn monitor(State(state): State<Arc<AppState>>) -> Response {
    match MonitorView::load(&state).await {
        Ok(view) => state.pages.respond(MONITOR, view),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;

    #[test]
    fn test_index_embeds_pie_data() {
        let dir = tempfile::tempdir().unwrap();
        let view = ConfigView::read(&dir.path().join(CONFIG_FILE_NAME));
        let html = Pages::new().unwrap().render(INDEX, view).unwrap();

        assert!(html.contains("renderChart([{"));
        assert!(html.contains(r#""original_name":"privacy""#));
        assert!(html.contains(r#"data-name="security""#));
    }

    #[test]
    fn test_index_dimension_keys_stay_out_of_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{
                "evaluation_weights": {"x');alert(1);('": {"weight": 1.0}},
                "test_configuration": {},
                "output_settings": {}
            }"#,
        )
        .unwrap();

        let html = Pages::new()
            .unwrap()
            .render(INDEX, ConfigView::read(&path))
            .unwrap();
        assert!(!html.contains("updateWeight('"));
        assert!(!html.contains("x');alert(1)"));
        assert!(html.contains("onclick=\"updateWeight(this.dataset.name)\""));
    }

    #[test]
    fn test_monitor_renders_listing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.json"), "{}").unwrap();
        let view = MonitorView {
            target_folder: "target".to_string(),
            source_folder: dir.path().display().to_string(),
            target_files: Vec::new(),
            source_files: crate::files::FileManager::new(dir.path(), dir.path())
                .list(crate::files::Folder::Source)
                .unwrap(),
            last_updated: "2026-01-01 00:00:00".to_string(),
            error: None,
        };
        let html = Pages::new().unwrap().render(MONITOR, view).unwrap();
        assert!(html.contains(r#"data-name="report.json""#));
        assert!(html.contains("empty"));
    }
}
