//! Video information structures

use serde::{Deserialize, Serialize};

/// Sentinel the extractor uses for an absent codec
pub const NO_CODEC: &str = "none";

/// Video information and metadata, as reported by the extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    /// Platform-native video ID
    pub id: String,
    /// Video title
    pub title: Option<String>,
    /// Video duration in seconds
    pub duration: Option<f64>,
    /// Uploader / channel name
    pub uploader: Option<String>,
    /// Video description
    pub description: Option<String>,
    /// Container extension of the final file
    pub ext: Option<String>,
    /// Available formats
    pub formats: Vec<Format>,
}

impl VideoInfo {
    /// Create a new VideoInfo
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Title or the empty string
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Formats that carry both an audio and a video track
    pub fn muxed_formats(&self) -> impl Iterator<Item = &Format> {
        self.formats.iter().filter(|f| f.is_muxed())
    }
}

/// Stream format information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    /// Extractor format ID
    pub format_id: String,
    /// Container extension
    pub ext: Option<String>,
    /// Resolution label (e.g. "1280x720", "audio only")
    pub resolution: Option<String>,
    /// File size in bytes (if known)
    pub filesize: Option<u64>,
    /// Format note/description
    pub format_note: Option<String>,
    /// Video codec
    pub vcodec: Option<String>,
    /// Audio codec
    pub acodec: Option<String>,
}

impl Format {
    /// Create a new Format
    pub fn new(format_id: impl Into<String>) -> Self {
        Self {
            format_id: format_id.into(),
            ..Default::default()
        }
    }

    /// Set both codecs
    pub fn with_codecs(mut self, vcodec: &str, acodec: &str) -> Self {
        self.vcodec = Some(vcodec.to_string());
        self.acodec = Some(acodec.to_string());
        self
    }

    /// Check if format carries audio
    pub fn has_audio(&self) -> bool {
        is_present_codec(self.acodec.as_deref())
    }

    /// Check if format carries video
    pub fn has_video(&self) -> bool {
        is_present_codec(self.vcodec.as_deref())
    }

    /// Check if format is muxed (video+audio combined)
    pub fn is_muxed(&self) -> bool {
        self.has_audio() && self.has_video()
    }
}

fn is_present_codec(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.is_empty() && c != NO_CODEC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_extractor_json() {
        let json = r#"{
            "id": "abc123",
            "title": "My Video",
            "duration": 212,
            "uploader": "Someone",
            "description": "hello",
            "ext": "mp4",
            "view_count": 10,
            "formats": [
                {"format_id": "18", "ext": "mp4", "resolution": "640x360",
                 "filesize": 1048576, "format_note": "360p",
                 "vcodec": "avc1.42001E", "acodec": "mp4a.40.2"},
                {"format_id": "140", "ext": "m4a", "resolution": "audio only",
                 "filesize": null, "vcodec": "none", "acodec": "mp4a.40.2"}
            ]
        }"#;

        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, "abc123");
        assert_eq!(info.title_or_default(), "My Video");
        assert_eq!(info.duration, Some(212.0));
        assert_eq!(info.formats.len(), 2);
        assert_eq!(info.formats[0].filesize, Some(1048576));
        assert_eq!(info.formats[1].filesize, None);
        assert_eq!(info.muxed_formats().count(), 1);
    }

    #[test]
    fn test_deserialize_sparse_json() {
        let info: VideoInfo = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(info.title_or_default(), "");
        assert!(info.formats.is_empty());
        assert!(info.uploader.is_none());
    }

    #[test]
    fn test_codec_presence() {
        let muxed = Format::new("18").with_codecs("avc1", "mp4a");
        assert!(muxed.is_muxed());

        let video_only = Format::new("137").with_codecs("avc1", "none");
        assert!(video_only.has_video());
        assert!(!video_only.has_audio());
        assert!(!video_only.is_muxed());

        let unknown = Format::new("sb0");
        assert!(!unknown.has_audio());
        assert!(!unknown.has_video());
    }
}
