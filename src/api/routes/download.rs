//! Download lifecycle handlers: submit, poll, fetch, list.

use super::{DownloadRequest, ListTasksQuery, RequestDownloadResponse};
use crate::api::AppState;
use crate::error::Error;
use crate::types::{Priority, SourceRef, TaskId, TaskPage, TaskSummary};
use crate::utils::sanitize_file_name;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// POST /download/request - Submit a message's media for background download
#[utoipa::path(
    post,
    path = "/download/request",
    tag = "download",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Task accepted and queued", body = RequestDownloadResponse),
        (status = 400, description = "Priority outside the accepted range"),
        (status = 503, description = "Service is shutting down")
    )
)]
pub async fn request_download(
    State(state): State<AppState>,
    Json(payload): Json<DownloadRequest>,
) -> Result<Json<RequestDownloadResponse>, Error> {
    let priority = match payload.priority {
        Some(raw) => Priority::new(raw)?,
        None => Priority::default(),
    };
    let source = SourceRef::new(payload.chat_id, payload.message_id);

    let task = state.depot.request_download(source, priority)?;

    Ok(Json(RequestDownloadResponse {
        task_id: task.id,
        status: task.status,
        created_at: task.created_at,
    }))
}

/// GET /download/status/:task_id - Poll a task's current snapshot
#[utoipa::path(
    get,
    path = "/download/status/{task_id}",
    tag = "download",
    params(
        ("task_id" = TaskId, Path, description = "Task identifier returned at submission")
    ),
    responses(
        (status = 200, description = "Current task snapshot", body = crate::types::TaskSummary),
        (status = 404, description = "Unknown task")
    )
)]
pub async fn download_status(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> Result<Json<TaskSummary>, Error> {
    let task = state.depot.task(task_id)?;
    Ok(Json(TaskSummary::from(&task)))
}

/// GET /download/fetch/:task_id - Stream a completed artifact to the client
#[utoipa::path(
    get,
    path = "/download/fetch/{task_id}",
    tag = "download",
    params(
        ("task_id" = TaskId, Path, description = "Task identifier returned at submission")
    ),
    responses(
        (status = 200, description = "Artifact bytes as an attachment", content_type = "application/octet-stream"),
        (status = 400, description = "Task has not completed yet"),
        (status = 404, description = "Unknown task"),
        (status = 500, description = "Artifact is missing or invalid on the server")
    )
)]
pub async fn fetch_download(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> Result<Response, Error> {
    // Validation demotes the task to failed when the artifact is gone, so a
    // client polling after this error sees the real state
    let (task, size) = state.depot.validate_artifact(task_id).await?;

    let path = task
        .file_path
        .clone()
        .ok_or(Error::MissingArtifact { id: task_id })?;
    let file = tokio::fs::File::open(&path).await.map_err(Error::Io)?;
    let stream = ReaderStream::with_capacity(file, state.config.storage.delivery_chunk_size);

    let file_name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => sanitize_file_name(task.file_name.as_deref(), &task.source),
    };

    tracing::debug!(task_id = %task_id, file = %path.display(), size, "Serving artifact");

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_LENGTH, size.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];

    Ok((headers, Body::from_stream(stream)).into_response())
}

/// GET /download/tasks - List tasks, newest first, with windowed pagination
#[utoipa::path(
    get,
    path = "/download/tasks",
    tag = "download",
    params(
        ("status" = Option<crate::types::TaskStatus>, Query, description = "Keep only tasks with this status, applied after the window"),
        ("limit" = Option<usize>, Query, description = "Window size (default: 50)"),
        ("offset" = Option<usize>, Query, description = "Tasks to skip before the window (default: 0)")
    ),
    responses(
        (status = 200, description = "One window of tasks", body = crate::types::TaskPage)
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Json<TaskPage> {
    let page = state.depot.list_tasks(
        query.status,
        query.limit.unwrap_or(50),
        query.offset.unwrap_or(0),
    );
    Json(page)
}
