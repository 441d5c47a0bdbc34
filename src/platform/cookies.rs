//! Browser cookie jar lookup

use crate::error::TubeError;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Cookie jar of one browser profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieJar {
    /// Browser name, e.g. "firefox"
    pub browser: String,
    /// Profile directory holding the cookie database
    pub profile: PathBuf,
    /// Cookie database file
    pub database: PathBuf,
}

impl CookieJar {
    /// `browser:profile` argument for `--cookies-from-browser`
    pub fn browser_arg(&self) -> String {
        format!("{}:{}", self.browser, self.profile.display())
    }
}

/// Source of browser cookie jars
#[async_trait::async_trait]
pub trait CookieSource: Send + Sync {
    /// Locate the cookie jar of the named browser
    async fn cookie_jar(&self, browser: &str) -> Result<CookieJar, TubeError>;
}

/// Best-effort lookup: failures are logged and turn into `None`
pub async fn load_cookie_jar(source: &dyn CookieSource, browser: Option<&str>) -> Option<CookieJar> {
    let browser = browser?;
    match source.cookie_jar(browser).await {
        Ok(jar) => {
            info!("Successfully got {} cookies from {}", browser, jar.profile.display());
            Some(jar)
        }
        Err(e) if e.is_recoverable() => {
            warn!("Failed to get {} cookies: {}", browser, e);
            None
        }
        Err(e) => {
            error!("Unexpected error while reading {} cookies, continuing without them: {}", browser, e);
            None
        }
    }
}

/// Finds cookie databases in the browser profile directories of the current user
#[derive(Debug, Clone, Default)]
pub struct BrowserProfiles {
    search_roots: Option<Vec<PathBuf>>,
}

impl BrowserProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search only below the given directories
    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.search_roots = Some(roots);
        self
    }

    fn roots_for(&self, browser: &str) -> Vec<PathBuf> {
        if let Some(roots) = &self.search_roots {
            return roots.clone();
        }

        let home = dirs::home_dir();
        let config = dirs::config_dir();
        let local = dirs::data_local_dir();
        let join = |base: &Option<PathBuf>, rel: &str| base.as_ref().map(|b| b.join(rel));

        let candidates = match browser {
            "firefox" => vec![
                join(&home, ".mozilla/firefox"),
                join(&home, "snap/firefox/common/.mozilla/firefox"),
                join(&config, "Mozilla/Firefox/Profiles"),
                join(&config, "Firefox/Profiles"),
            ],
            "chrome" => vec![
                join(&config, "google-chrome"),
                join(&config, "Google/Chrome"),
                join(&local, "Google/Chrome/User Data"),
            ],
            "chromium" => vec![
                join(&config, "chromium"),
                join(&config, "Chromium"),
                join(&local, "Chromium/User Data"),
            ],
            "brave" => vec![
                join(&config, "BraveSoftware/Brave-Browser"),
                join(&local, "BraveSoftware/Brave-Browser/User Data"),
            ],
            "edge" => vec![
                join(&config, "microsoft-edge"),
                join(&config, "Microsoft Edge"),
                join(&local, "Microsoft/Edge/User Data"),
            ],
            _ => Vec::new(),
        };

        candidates.into_iter().flatten().collect()
    }
}

#[async_trait::async_trait]
impl CookieSource for BrowserProfiles {
    async fn cookie_jar(&self, browser: &str) -> Result<CookieJar, TubeError> {
        let browser = browser.trim().to_lowercase();
        let database_name = cookie_database_name(&browser)
            .ok_or_else(|| TubeError::Cookies(format!("unsupported browser: {}", browser)))?;
        let roots = self.roots_for(&browser);

        let found = tokio::task::spawn_blocking(move || newest_database(&roots, database_name))
            .await
            .map_err(|e| TubeError::Cookies(format!("profile scan failed: {}", e)))?;

        let database = found.ok_or_else(|| {
            TubeError::Cookies(format!("no {} profile with a cookie database found", browser))
        })?;
        debug!("Using cookie database {}", database.display());

        Ok(CookieJar {
            profile: profile_dir(&database),
            browser,
            database,
        })
    }
}

fn cookie_database_name(browser: &str) -> Option<&'static str> {
    match browser {
        "firefox" => Some("cookies.sqlite"),
        "chrome" | "chromium" | "brave" | "edge" => Some("Cookies"),
        _ => None,
    }
}

// Most recently modified cookie database below any of the roots
fn newest_database(roots: &[PathBuf], database_name: &str) -> Option<PathBuf> {
    roots
        .iter()
        .filter(|root| root.is_dir())
        .flat_map(|root| WalkDir::new(root).max_depth(3).into_iter().filter_map(|e| e.ok()))
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == database_name)
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.into_path())
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

// Chromium keeps newer databases in `<profile>/Network/Cookies`
fn profile_dir(database: &Path) -> PathBuf {
    let parent = database.parent().unwrap_or(database);
    if parent.file_name().is_some_and(|name| name == "Network") {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}
