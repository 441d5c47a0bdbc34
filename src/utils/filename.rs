//! Safe filename generation utilities

use regex::Regex;
use std::sync::LazyLock;
use unicode_general_category::{get_general_category, GeneralCategory};

/// Longest title stem kept before the final ASCII pass
pub const MAX_TITLE_CHARS: usize = 50;

/// Stem used when nothing survives sanitizing
pub const FALLBACK_TITLE: &str = "video";

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid regex"));

/// Convert a video title into a filesystem-safe identifier.
///
/// Illegal and control characters are stripped, spaces become underscores,
/// the result is cut to [`MAX_TITLE_CHARS`] characters and falls back to
/// [`FALLBACK_TITLE`] when empty. A last pass keeps only ASCII letters,
/// digits, `_` and `-`; it runs after the fallback, so an all non-ASCII
/// title still ends up empty.
pub fn sanitize_title(raw: &str) -> String {
    let title = INVALID_CHARS.replace_all(raw, "");

    let title: String = title
        .chars()
        .filter(|c| !is_other_category(*c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();

    let mut title: String = title.trim().chars().take(MAX_TITLE_CHARS).collect();

    if title.is_empty() {
        title = FALLBACK_TITLE.to_string();
    }

    UNSAFE_CHARS.replace_all(&title, "").into_owned()
}

/// Build the final on-disk name `{title}_{video_id}.{ext}`
pub fn final_filename(safe_title: &str, video_id: &str, ext: &str) -> String {
    format!("{}_{}.{}", safe_title, video_id, ext.trim_start_matches('.'))
}

// Unicode general category "C": control, format, surrogate, private use and unassigned
fn is_other_category(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
    )
}
