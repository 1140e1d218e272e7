//! Job control API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use vidstage_core::{FileSource, JobSnapshot, SubmitError};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for selecting a source.
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    /// Local path of the media to stage.
    pub source_path: String,
}

/// Request/response body for the storage permission signal.
#[derive(Debug, Serialize, Deserialize)]
pub struct StorageAccess {
    pub granted: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable rejection reason, e.g. "already_busy".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn submit_error(err: SubmitError) -> ApiError {
    let status = match &err {
        SubmitError::AlreadyBusy { .. } | SubmitError::NotStaged { .. } => StatusCode::CONFLICT,
        SubmitError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind: Some(err.kind().to_string()),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the current job snapshot
pub async fn get_job(State(state): State<Arc<AppState>>) -> Json<JobSnapshot> {
    Json(state.orchestrator().snapshot())
}

/// Select a source and start staging it.
///
/// Returns 202 once the job is `Ingesting`; the outcome arrives on the
/// status feed.
pub async fn submit_selection(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> Result<(StatusCode, Json<JobSnapshot>), ApiError> {
    let source_path = request.source_path.trim();
    if source_path.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "source_path must not be empty".to_string(),
                kind: None,
            }),
        ));
    }

    // Storage resolution touches the filesystem under the job lock
    let orchestrator = state.orchestrator().clone();
    let source = Arc::new(FileSource::new(source_path));
    let snapshot = tokio::task::spawn_blocking(move || orchestrator.submit_selection(source))
        .await
        .map_err(|e| {
            error!("Selection task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "selection could not be processed".to_string(),
                    kind: None,
                }),
            )
        })?
        .map_err(submit_error)?;

    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// Start transcoding the staged file.
pub async fn submit_transcode(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<JobSnapshot>), ApiError> {
    let snapshot = state
        .orchestrator()
        .submit_transcode()
        .map_err(submit_error)?;

    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// Get the storage permission signal
pub async fn get_storage_access(State(state): State<Arc<AppState>>) -> Json<StorageAccess> {
    Json(StorageAccess {
        granted: state.storage_access().is_granted(),
    })
}

/// Grant or revoke storage access.
///
/// Takes effect at the next selection; work already in flight is unaffected.
pub async fn set_storage_access(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StorageAccess>,
) -> Json<StorageAccess> {
    state.storage_access().set(request.granted);
    info!("Storage access {}", if request.granted { "granted" } else { "revoked" });
    Json(StorageAccess {
        granted: request.granted,
    })
}
