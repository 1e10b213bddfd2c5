use std::sync::Arc;

use axum::extract::{Json, Path};
use axum::routing::{get, post};
use axum::Extension;
use axum::Router;

use task_api::types::task::{TaskAccepted, TaskRecord, TaskSubmission};

use crate::api::probes::readiness;
use crate::api::ApiError;
use crate::context::Context;
use crate::util::derive_repo_name;

pub fn router() -> Router {
    Router::new()
        .route("/ready", post(submit).get(readiness))
        .route("/status/{task_id}", get(status))
}

/// Accept a task and start working on it in the background.
/// Answers before any work has been done.
pub async fn submit(
    Extension(ctx): Extension<Arc<Context>>,
    Json(submission): Json<TaskSubmission>,
) -> Result<Json<TaskAccepted>, ApiError> {
    if submission.secret != ctx.shared_secret {
        log::warn!("Rejected task {}: invalid secret", submission.task);
        return Err(ApiError::Unauthorized);
    }
    let Some(orchestrator) = ctx.orchestrator.clone() else {
        return Err(ApiError::Configuration(
            "generation or GitHub credentials are missing",
        ));
    };

    let repo_name = derive_repo_name(&submission.task, submission.round);
    let record = TaskRecord::accepted(submission, repo_name.clone());
    let accepted = TaskAccepted {
        id: record.id.clone(),
        status: record.status,
        repo_name,
    };

    ctx.store.put(record).await;
    log::info!(
        "Accepted task {} as {} ({} tracked)",
        accepted.id,
        accepted.repo_name,
        ctx.store.len().await
    );
    orchestrator.spawn(accepted.id.clone());

    Ok(Json(accepted))
}

pub async fn status(
    Extension(ctx): Extension<Arc<Context>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskRecord>, ApiError> {
    ctx.store
        .get(&task_id)
        .await
        .map(Json)
        .map_err(|_| ApiError::NotFound(task_id))
}
