//! Extraction/download capability used by the format lister and the workers

use crate::core::{ProgressSink, VideoInfo};
use crate::error::TubeError;
use crate::platform::cookies::CookieJar;
use std::path::Path;

/// Selector asking for the best MP4 video+audio pair, then the best MP4, then anything
pub const DEFAULT_FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Parameters of a single download
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Media page URL
    pub url: &'a str,
    /// Format selector understood by the extractor
    pub format_selector: &'a str,
    /// Directory the file is written to, named `{video_id}.{ext}`
    pub output_dir: &'a Path,
    /// Browser cookie jar to authenticate with
    pub cookies: Option<&'a CookieJar>,
}

/// External extraction/download capability.
///
/// Implementations negotiate with the video platform, pick and mux streams
/// and write the result to disk.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Read metadata and the format list without downloading media
    async fn probe(&self, url: &str, cookies: Option<&CookieJar>) -> Result<VideoInfo, TubeError>;

    /// Download media into `request.output_dir`, reporting progress to `progress`.
    ///
    /// Returns the metadata of the downloaded video.
    async fn fetch(
        &self,
        request: FetchRequest<'_>,
        progress: ProgressSink,
    ) -> Result<VideoInfo, TubeError>;
}

/// Map the user-facing format ID to an extractor selector
pub fn resolve_format_selector(format_id: &str) -> &str {
    let format_id = format_id.trim();
    if format_id.is_empty() || format_id == "best" {
        DEFAULT_FORMAT_SELECTOR
    } else {
        format_id
    }
}
