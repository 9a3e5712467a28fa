//! HTTP intake: upload a deck, poll for its explanation.

use std::path::{Path, PathBuf};

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use explainer_core::slides;
use explainer_core::{explain_deck, JobOutcome, JobRunner, JobStatus, ResultStore};

use crate::error::{ApiError, ApiResult};
use crate::intake::{sanitize_file_name, UploadDir};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadDir,
    pub store: ResultStore,
    pub runner: JobRunner,
}

impl AppState {
    pub fn new(
        uploads_dir: impl Into<PathBuf>,
        outputs_dir: impl Into<PathBuf>,
        runner: JobRunner,
    ) -> Self {
        Self {
            uploads: UploadDir::new(uploads_dir),
            store: ResultStore::in_dir(outputs_dir),
            runner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub uid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Pending,
    Done,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: StatusKind,
    pub filename: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<JobOutcome>,
}

impl StatusReport {
    pub fn is_done(&self) -> bool {
        self.status == StatusKind::Done
    }
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    uid: Option<String>,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/status", get(status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "slide-explainer",
        "message": "POST a deck to /upload, then poll /status?uid=...",
    }))
}

async fn health() -> &'static str {
    "ok"
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_upload(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(sanitize_file_name)
            .ok_or_else(ApiError::missing_file)?;
        if !slides::is_supported(Path::new(&file_name)) {
            return Err(ApiError::unsupported_file());
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::invalid_upload(e.body_text()))?;

        let uploads = state.uploads.clone();
        let record = run_blocking(move || uploads.store(&file_name, &bytes)).await?;
        tracing::info!(uid = %record.uid, file = %record.original_name, "Accepted upload");

        spawn_job(&state, record.path);
        return Ok(Json(UploadResponse { uid: record.uid }));
    }

    Err(ApiError::missing_file())
}

/// Run the job in the background; the upload request returns immediately.
fn spawn_job(state: &AppState, path: PathBuf) {
    let runner = state.runner.clone();
    let store = state.store.clone();
    tokio::spawn(async move {
        match explain_deck(&runner, &store, &path).await {
            Ok((artifact, outcome)) => tracing::info!(
                artifact = %artifact.display(),
                slides = outcome.len(),
                failed = outcome.failed_count(),
                "Job complete"
            ),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "Job failed"),
        }
    });
}

async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<StatusReport>> {
    let uid = query
        .uid
        .filter(|uid| !uid.trim().is_empty())
        .ok_or_else(ApiError::missing_uid)?;

    let uploads = state.uploads.clone();
    let uid = uid.trim().to_string();
    let record = run_blocking(move || uploads.find(&uid))
        .await?
        .ok_or_else(ApiError::upload_not_found)?;

    let store = state.store.clone();
    let path = record.path.clone();
    let (status, explanation) = match run_blocking(move || store.status(&path)).await? {
        JobStatus::Pending => (StatusKind::Pending, None),
        JobStatus::Done { outcome } => (StatusKind::Done, Some(outcome)),
    };

    Ok(Json(StatusReport {
        status,
        filename: record.original_name,
        timestamp: record.timestamp,
        explanation,
    }))
}

/// Run filesystem work on the blocking pool.
async fn run_blocking<T, E, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Blocking task failed: {e}")))?
        .map_err(Into::into)
}
