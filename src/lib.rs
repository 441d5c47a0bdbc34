//! # tubedrop - local video download front-end
//!
//! Small web server that lets a browser submit a video URL, pick a format
//! and get an MP4 file back, with progress polling.
//!
//! ## Features
//!
//! - Format listing restricted to streams with both audio and video
//! - Background downloads with per-task progress
//! - Safe, ASCII-only output filenames
//! - Browser cookie reuse for sites that require a login
//! - `yt-dlp` as the extraction and download backend
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tubedrop::core::{DownloadSettings, DownloadWorker, TaskStore};
//! use tubedrop::platform::{BrowserProfiles, YtDlp};
//!
//! #[tokio::main]
//! async fn main() {
//!     let worker = DownloadWorker::new(
//!         TaskStore::new(),
//!         Arc::new(YtDlp::new()),
//!         Arc::new(BrowserProfiles::new()),
//!         DownloadSettings::default(),
//!     );
//!
//!     let task_id = worker.store().next_id();
//!     worker
//!         .start("VIDEO_URL".to_string(), task_id.clone(), "best".to_string())
//!         .await
//!         .ok();
//!     println!("{:?}", worker.store().get(&task_id));
//! }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod platform;
pub mod server;
pub mod utils;

// Re-export main types
pub use crate::core::{DownloadSettings, DownloadWorker, FormatLister, Task, TaskStatus, TaskStore, VideoInfo};
pub use crate::error::TubeError;

/// Result type alias for tubedrop operations
pub type Result<T> = std::result::Result<T, TubeError>;
