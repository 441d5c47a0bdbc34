//! URL utilities for video platform URLs

use tracing::info;

/// Rewrite a "shorts" URL into a canonical watch URL.
///
/// This is a plain substring rewrite of the first `shorts/` occurrence, not a
/// URL parse, so the pattern anywhere in the URL triggers it.
pub fn normalize_shorts_url(url: &str) -> String {
    if is_shorts_url(url) {
        let converted = url.replacen("shorts/", "watch?v=", 1);
        info!("Converted shorts URL to: {}", converted);
        converted
    } else {
        url.to_string()
    }
}

/// Check if URL points at a shorts video
pub fn is_shorts_url(url: &str) -> bool {
    url.contains("shorts/")
}
