//! Request handlers

use crate::core::{FormatsResponse, Task};
use crate::server::page::render_index;
use crate::server::AppState;
use axum::extract::{Path as AxumPath, Query, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn default_format_id() -> String {
    "best".to_string()
}

#[derive(Debug, Deserialize)]
pub struct FormatsQuery {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: String,
    #[serde(default = "default_format_id")]
    pub format_id: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadAccepted {
    pub task_id: String,
}

/// `/status` body
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    Found(Task),
    NotFound { status: &'static str },
}

impl From<Option<Task>> for StatusResponse {
    fn from(task: Option<Task>) -> Self {
        match task {
            Some(task) => StatusResponse::Found(task),
            None => StatusResponse::NotFound { status: "not_found" },
        }
    }
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.store.completed()))
}

pub async fn formats(
    State(state): State<AppState>,
    Query(query): Query<FormatsQuery>,
) -> Json<FormatsResponse> {
    Json(state.lister.list(&query.url).await.into())
}

pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Json<DownloadAccepted> {
    let task_id = state.store.next_id();
    info!("Accepted download {} of {} (format {})", task_id, query.url, query.format_id);

    state.worker.start(query.url, task_id.clone(), query.format_id);
    Json(DownloadAccepted { task_id })
}

/// Current state of a task, or `{"status": "not_found"}`.
///
/// `mime_type` on a completed task follows the downloaded file's extension:
/// `video/mp4` for the usual merged output, `video/webm` and the like when
/// the extractor produced another container.
pub async fn status(
    State(state): State<AppState>,
    AxumPath(task_id): AxumPath<String>,
) -> Json<StatusResponse> {
    let task = state.store.get(&task_id);
    if task.is_none() {
        debug!("Status requested for unknown task {}", task_id);
    }
    Json(task.into())
}
