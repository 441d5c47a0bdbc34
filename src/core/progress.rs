//! Progress tracking for downloads

use std::sync::Arc;
use std::time::Duration;

/// Progress event emitted by the extractor while media bytes arrive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Number of bytes downloaded so far
    pub downloaded_bytes: u64,
    /// Total size of the stream in bytes, when the extractor knows it
    pub total_bytes: Option<u64>,
}

/// Callback receiving progress events
pub type ProgressSink = Arc<dyn Fn(Progress) + Send + Sync>;

impl Progress {
    /// Create a new progress event
    pub fn new(downloaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self {
            downloaded_bytes,
            total_bytes,
        }
    }

    /// Download progress as a percentage, `None` while the total is unknown
    pub fn percent(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some((self.downloaded_bytes as f64 / total as f64) * 100.0)
            }
            _ => None,
        }
    }

    /// Percentage rounded to two decimals
    pub fn rounded_percent(&self) -> Option<f64> {
        self.percent().map(|p| (p * 100.0).round() / 100.0)
    }

    /// Check if download is complete
    pub fn is_complete(&self) -> bool {
        matches!(self.total_bytes, Some(total) if total > 0 && self.downloaded_bytes >= total)
    }
}

/// Format a byte count in mebibytes, the way the format list shows sizes
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = (bytes_f64.ln() / THRESHOLD.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f64 / THRESHOLD.powi(exp as i32);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    if total_seconds < 60 {
        format!("{}s", total_seconds)
    } else if total_seconds < 3600 {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        if seconds == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, seconds)
        }
    } else {
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    }
}
