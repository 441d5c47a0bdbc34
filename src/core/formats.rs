//! Format listing for the quality picker

use crate::core::progress::format_megabytes;
use crate::core::video_info::{Format, VideoInfo};
use crate::error::TubeError;
use crate::platform::{load_cookie_jar, CookieSource, Extractor};
use crate::utils::normalize_shorts_url;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Simplified view of one selectable stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    pub resolution: String,
    /// Size in bytes, when known
    pub filesize: Option<u64>,
    /// Size as "X.X MB" or "Unknown"
    pub filesize_str: String,
    pub format_note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    pub has_audio: bool,
    pub has_video: bool,
}

impl FormatInfo {
    /// Project an extractor format
    pub fn from_format(format: &Format) -> Self {
        Self {
            format_id: format.format_id.clone(),
            ext: format.ext.clone().unwrap_or_default(),
            resolution: format.resolution.clone().unwrap_or_else(|| "N/A".to_string()),
            filesize: format.filesize,
            filesize_str: filesize_label(format.filesize),
            format_note: format.format_note.clone().unwrap_or_default(),
            vcodec: format.vcodec.clone(),
            acodec: format.acodec.clone(),
            has_audio: format.has_audio(),
            has_video: format.has_video(),
        }
    }

    /// Placeholder offered when no muxed stream exists
    pub fn best_placeholder() -> Self {
        Self {
            format_id: "best".to_string(),
            ext: "mp4".to_string(),
            resolution: "Best quality".to_string(),
            filesize: None,
            filesize_str: "Unknown".to_string(),
            format_note: "Best quality with audio".to_string(),
            vcodec: None,
            acodec: None,
            has_audio: true,
            has_video: true,
        }
    }
}

/// Successful `/formats` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatListing {
    pub formats: Vec<FormatInfo>,
    pub title: String,
}

/// `/formats` body: a listing or an inline error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormatsResponse {
    Listing(FormatListing),
    Failure { error: String },
}

impl From<Result<FormatListing, TubeError>> for FormatsResponse {
    fn from(result: Result<FormatListing, TubeError>) -> Self {
        match result {
            Ok(listing) => FormatsResponse::Listing(listing),
            Err(e) => FormatsResponse::Failure {
                error: e.to_string(),
            },
        }
    }
}

fn filesize_label(filesize: Option<u64>) -> String {
    match filesize {
        Some(bytes) if bytes > 0 => format_megabytes(bytes),
        _ => "Unknown".to_string(),
    }
}

/// Keep only muxed streams, falling back to a single "best" entry
pub fn shape_formats(info: &VideoInfo) -> FormatListing {
    let mut formats: Vec<FormatInfo> = info.muxed_formats().map(FormatInfo::from_format).collect();

    if formats.is_empty() {
        debug!("No muxed formats for {}, offering best", info.id);
        formats.push(FormatInfo::best_placeholder());
    }

    FormatListing {
        formats,
        title: info.title_or_default().to_string(),
    }
}

/// Lists the downloadable formats of a URL
#[derive(Clone)]
pub struct FormatLister {
    extractor: Arc<dyn Extractor>,
    cookies: Arc<dyn CookieSource>,
    cookie_browser: Option<String>,
}

impl FormatLister {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        cookies: Arc<dyn CookieSource>,
        cookie_browser: Option<String>,
    ) -> Self {
        Self {
            extractor,
            cookies,
            cookie_browser,
        }
    }

    /// Probe the URL and shape its formats; extractor failures are returned, not retried
    pub async fn list(&self, url: &str) -> Result<FormatListing, TubeError> {
        let jar = load_cookie_jar(self.cookies.as_ref(), self.cookie_browser.as_deref()).await;
        let url = normalize_shorts_url(url);

        match self.extractor.probe(&url, jar.as_ref()).await {
            Ok(info) => Ok(shape_formats(&info)),
            Err(e) => {
                error!("Error getting formats: {}", e);
                Err(e)
            }
        }
    }
}
