//! MIME type utilities for downloaded media

/// MIME type of the MP4 container downloads are merged into
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Get MIME type from file extension
pub fn mime_from_ext(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.').to_lowercase();
    match ext.as_str() {
        // Video formats
        "mp4" | "m4v" => DEFAULT_VIDEO_MIME,
        "webm" => "video/webm",
        "3gp" => "video/3gpp",
        "flv" => "video/x-flv",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",

        // Audio formats
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "opus" => "audio/opus",

        // Default fallback
        _ => "application/octet-stream",
    }
}

/// Check if the extension names a partial or sidecar file the extractor leaves behind
pub fn is_partial_ext(extension: &str) -> bool {
    matches!(
        extension.trim_start_matches('.').to_lowercase().as_str(),
        "part" | "ytdl" | "tmp" | "temp" | "json"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_ext() {
        assert_eq!(mime_from_ext("mp4"), "video/mp4");
        assert_eq!(mime_from_ext(".mp4"), "video/mp4");
        assert_eq!(mime_from_ext("MP4"), "video/mp4");
        assert_eq!(mime_from_ext("webm"), "video/webm");
        assert_eq!(mime_from_ext("mkv"), "video/x-matroska");
        assert_eq!(mime_from_ext("m4a"), "audio/mp4");
        assert_eq!(mime_from_ext("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_is_partial_ext() {
        assert!(is_partial_ext("part"));
        assert!(is_partial_ext(".ytdl"));
        assert!(!is_partial_ext("mp4"));
        assert!(!is_partial_ext("webm"));
    }
}
