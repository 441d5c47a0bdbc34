//! Download task model

use serde::{Deserialize, Serialize};

/// Longest description kept on a completed task, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Downloading,
    Completed,
    Error,
}

impl TaskStatus {
    /// Check if no further writes may follow
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

/// Metadata recorded once a download finished
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedDownload {
    /// Sanitized title
    pub title: String,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    /// Description, truncated to [`MAX_DESCRIPTION_CHARS`]
    pub description: String,
    /// Final file name inside the videos directory
    pub filename: String,
    /// Public path the file is served from
    pub file_path: String,
    /// MIME type of the final file's container, normally `video/mp4`
    pub mime_type: String,
}

/// One download request's tracked state, serialized as the `/status` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub status: TaskStatus,
    /// Percentage in [0, 100]
    pub progress: f64,
    #[serde(flatten)]
    pub download: Option<CompletedDownload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    /// Fresh task, downloading at 0%
    pub fn new() -> Self {
        Self {
            status: TaskStatus::Downloading,
            progress: 0.0,
            download: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut a description to [`MAX_DESCRIPTION_CHARS`] characters
pub fn truncate_description(description: &str) -> String {
    description.chars().take(MAX_DESCRIPTION_CHARS).collect()
}
