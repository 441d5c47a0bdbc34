//! Background download workers

use crate::core::progress::{format_bytes, Progress, ProgressSink};
use crate::core::store::TaskStore;
use crate::core::task::{truncate_description, CompletedDownload};
use crate::core::video_info::VideoInfo;
use crate::error::TubeError;
use crate::platform::{load_cookie_jar, resolve_format_selector, CookieSource, Extractor, FetchRequest};
use crate::utils::{
    final_filename, is_partial_ext, mime_from_ext, normalize_shorts_url, sanitize_title,
    FALLBACK_TITLE,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Public URL prefix the videos directory is served under
pub const DEFAULT_PUBLIC_PREFIX: &str = "/static/videos";

/// Download configuration
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Directory downloads are written to
    pub videos_dir: PathBuf,
    /// URL prefix mapping to `videos_dir`
    pub public_prefix: String,
    /// Browser whose cookies are offered to the extractor
    pub cookie_browser: Option<String>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            videos_dir: PathBuf::from("static").join("videos"),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            cookie_browser: Some("firefox".to_string()),
        }
    }
}

impl DownloadSettings {
    /// Public path of a file inside the videos directory
    pub fn public_path(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix.trim_end_matches('/'), filename)
    }
}

/// Runs downloads in the background and records their state in the task store.
///
/// Each task is written by exactly one worker run: registration, zero or more
/// progress updates, then one terminal update.
#[derive(Clone)]
pub struct DownloadWorker {
    store: TaskStore,
    extractor: Arc<dyn Extractor>,
    cookies: Arc<dyn CookieSource>,
    settings: Arc<DownloadSettings>,
}

impl DownloadWorker {
    pub fn new(
        store: TaskStore,
        extractor: Arc<dyn Extractor>,
        cookies: Arc<dyn CookieSource>,
        settings: DownloadSettings,
    ) -> Self {
        Self {
            store,
            extractor,
            cookies,
            settings: Arc::new(settings),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn settings(&self) -> &DownloadSettings {
        &self.settings
    }

    /// Register the task and run the download on its own tokio task
    pub fn start(&self, url: String, task_id: String, format_id: String) -> JoinHandle<()> {
        self.store.register(&task_id);
        let worker = self.clone();
        tokio::spawn(async move { worker.run(&url, &task_id, &format_id).await })
    }

    /// Download `url` and record the terminal state of `task_id`
    pub async fn run(&self, url: &str, task_id: &str, format_id: &str) {
        match self.download(url, task_id, format_id).await {
            Ok(download) => {
                info!("Task {} completed: {}", task_id, download.filename);
                self.store.complete(task_id, download);
            }
            Err(e) => {
                if e.is_extractor_error() {
                    warn!("Extractor failed for task {}: {}", task_id, e);
                } else {
                    error!("Download error for task {}: {}", task_id, e);
                }
                self.store.fail(task_id, e.to_string());
            }
        }
    }

    async fn download(
        &self,
        url: &str,
        task_id: &str,
        format_id: &str,
    ) -> Result<CompletedDownload, TubeError> {
        let url = normalize_shorts_url(url);
        let jar = load_cookie_jar(self.cookies.as_ref(), self.settings.cookie_browser.as_deref()).await;

        let request = FetchRequest {
            url: &url,
            format_selector: resolve_format_selector(format_id),
            output_dir: &self.settings.videos_dir,
            cookies: jar.as_ref(),
        };
        info!("Starting download of {} for task {}", url, task_id);
        let info = self.extractor.fetch(request, self.progress_sink(task_id)).await?;
        debug!("Video ID: {}", info.id);

        let temp_path = self.locate_output(&info).await?;
        let ext = temp_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4")
            .to_string();

        let safe_title = sanitize_title(info.title.as_deref().unwrap_or(FALLBACK_TITLE));
        let target_name = final_filename(&safe_title, &info.id, &ext);
        let target_path = self.settings.videos_dir.join(&target_name);

        let (final_path, filename) = match tokio::fs::rename(&temp_path, &target_path).await {
            Ok(()) => {
                info!("File renamed from {} to {}", temp_path.display(), target_path.display());
                (target_path, target_name)
            }
            Err(e) => {
                warn!("Failed to rename file: {}", e);
                let name = file_name_of(&temp_path);
                (temp_path, name)
            }
        };

        if let Ok(metadata) = tokio::fs::metadata(&final_path).await {
            info!("Saved {} ({})", final_path.display(), format_bytes(metadata.len()));
        }

        Ok(CompletedDownload {
            title: safe_title,
            duration: info.duration,
            uploader: info.uploader,
            description: truncate_description(info.description.as_deref().unwrap_or_default()),
            file_path: self.settings.public_path(&filename),
            filename,
            mime_type: mime_from_ext(&ext).to_string(),
        })
    }

    fn progress_sink(&self, task_id: &str) -> ProgressSink {
        let store = self.store.clone();
        let task_id = task_id.to_string();
        Arc::new(move |progress: Progress| {
            if let Some(percent) = progress.rounded_percent() {
                debug!("Download progress for {}: {}%", task_id, percent);
                store.set_progress(&task_id, percent);
            }
            if progress.is_complete() {
                debug!("All bytes received for {}", task_id);
            }
        })
    }

    /// Find the file the extractor wrote, named after the video ID.
    ///
    /// MP4 is expected; another container with the same stem is accepted.
    async fn locate_output(&self, info: &VideoInfo) -> Result<PathBuf, TubeError> {
        let dir = &self.settings.videos_dir;
        let expected = dir.join(format!("{}.mp4", info.id));

        if info.id.is_empty() {
            return Err(TubeError::MissingOutput(expected));
        }
        if tokio::fs::try_exists(&expected).await? {
            return Ok(expected);
        }

        let dir_owned = dir.clone();
        let video_id = info.id.clone();
        let expected_owned = expected.clone();
        let found = tokio::task::spawn_blocking(move || {
            scan_for_output(&dir_owned, &video_id, &expected_owned)
        })
        .await
        .map_err(|e| TubeError::Generic(format!("output scan failed: {}", e)))?;

        match found {
            Some(path) => {
                warn!("Expected {} but the extractor wrote {}", expected.display(), path.display());
                Ok(path)
            }
            None => Err(TubeError::MissingOutput(expected)),
        }
    }
}

// Blocking: walks the download directory
fn scan_for_output(dir: &Path, video_id: &str, expected: &Path) -> Option<PathBuf> {
    let found = find_by_stem(dir, video_id);
    if found.is_none() {
        warn!("Temp file not found at: {}", expected.display());
        log_directory_contents(dir);
    }
    found
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn find_by_stem(dir: &Path, video_id: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .find(|path| {
            let stem_matches = path.file_stem().is_some_and(|stem| stem == video_id);
            let ext_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| !is_partial_ext(ext));
            stem_matches && ext_ok
        })
}

fn log_directory_contents(dir: &Path) {
    warn!("Directory contents of {}:", dir.display());
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).into_iter().filter_map(|e| e.ok()) {
        warn!("- {}", entry.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::TaskStatus;
    use crate::platform::CookieJar;
    use std::collections::HashSet;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// Writes `{id}.{ext}` into the output directory after emitting progress
    struct FakeExtractor {
        title: Option<String>,
        ext: &'static str,
        write_file: bool,
        failure: Option<String>,
        progress: Vec<Progress>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeExtractor {
        fn ok(title: &str) -> Self {
            Self {
                title: Some(title.to_string()),
                ext: "mp4",
                write_file: true,
                failure: None,
                progress: vec![
                    Progress::new(250, Some(1000)),
                    Progress::new(300, None),
                    Progress::new(1000, Some(1000)),
                ],
                gate: None,
            }
        }
    }

    fn video_id_from(url: &str) -> String {
        url.rsplit("v=").next().unwrap_or_default().to_string()
    }

    #[async_trait::async_trait]
    impl Extractor for FakeExtractor {
        async fn probe(&self, url: &str, _cookies: Option<&CookieJar>) -> Result<VideoInfo, TubeError> {
            Ok(VideoInfo::new(video_id_from(url), "probe"))
        }

        async fn fetch(&self, request: FetchRequest<'_>, progress: ProgressSink) -> Result<VideoInfo, TubeError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(message) = &self.failure {
                return Err(TubeError::Download(message.clone()));
            }
            for event in &self.progress {
                progress(*event);
            }

            let id = video_id_from(request.url);
            if self.write_file {
                let path = request.output_dir.join(format!("{}.{}", id, self.ext));
                tokio::fs::write(path, b"media").await?;
            }

            let mut info = VideoInfo::new(id, "");
            info.title = self.title.clone();
            info.duration = Some(61.0);
            info.uploader = Some("Uploader".to_string());
            info.description = Some("d".repeat(700));
            Ok(info)
        }
    }

    struct NoCookies;

    #[async_trait::async_trait]
    impl CookieSource for NoCookies {
        async fn cookie_jar(&self, _browser: &str) -> Result<CookieJar, TubeError> {
            Err(TubeError::Cookies("no profile".to_string()))
        }
    }

    fn worker_with(extractor: FakeExtractor) -> (DownloadWorker, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let settings = DownloadSettings {
            videos_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let worker = DownloadWorker::new(
            TaskStore::new(),
            Arc::new(extractor),
            Arc::new(NoCookies),
            settings,
        );
        (worker, dir)
    }

    #[tokio::test]
    async fn test_shorts_download_completes() {
        let (worker, dir) = worker_with(FakeExtractor::ok("My Video Title"));
        let task_id = worker.store().next_id();

        worker
            .start("https://x/shorts/abc123".to_string(), task_id.clone(), "best".to_string())
            .await
            .unwrap();

        let task = worker.store().get(&task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100.0);

        let download = task.download.unwrap();
        assert_eq!(download.title, "My_Video_Title");
        assert_eq!(download.filename, "My_Video_Title_abc123.mp4");
        assert_eq!(download.file_path, "/static/videos/My_Video_Title_abc123.mp4");
        assert_eq!(download.mime_type, "video/mp4");
        assert_eq!(download.duration, Some(61.0));
        assert_eq!(download.uploader.as_deref(), Some("Uploader"));
        assert_eq!(download.description.chars().count(), 500);

        assert!(dir.path().join("My_Video_Title_abc123.mp4").exists());
        assert!(!dir.path().join("abc123.mp4").exists());
    }

    #[tokio::test]
    async fn test_task_visible_before_terminal_state() {
        let gate = Arc::new(Notify::new());
        let mut extractor = FakeExtractor::ok("Gated");
        extractor.gate = Some(gate.clone());
        let (worker, _dir) = worker_with(extractor);

        let handle = worker.start(
            "https://x/watch?v=gated1".to_string(),
            "t1".to_string(),
            "best".to_string(),
        );

        let task = worker.store().get("t1").unwrap();
        assert_eq!(task.status, TaskStatus::Downloading);
        assert_eq!(task.progress, 0.0);

        gate.notify_one();
        handle.await.unwrap();
        assert_eq!(worker.store().get("t1").unwrap().status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_total_keeps_last_progress() {
        let mut extractor = FakeExtractor::ok("Partial");
        extractor.progress = vec![Progress::new(1, Some(3)), Progress::new(5000, None)];
        extractor.write_file = false;
        let (worker, _dir) = worker_with(extractor);

        worker
            .start("https://x/watch?v=p1".to_string(), "t".to_string(), "best".to_string())
            .await
            .unwrap();
        // Missing output fails the task but the last known percentage stays
        let task = worker.store().get("t").unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.progress, 33.33);
    }

    #[tokio::test]
    async fn test_run_without_registration_stores_nothing() {
        let (worker, _dir) = worker_with(FakeExtractor::ok("Unregistered"));
        worker.run("https://x/watch?v=u1", "t", "best").await;
        assert!(worker.store().get("t").is_none());
    }

    #[tokio::test]
    async fn test_extractor_failure_becomes_error_state() {
        let mut extractor = FakeExtractor::ok("x");
        extractor.failure = Some("ERROR: [youtube] nope: Video unavailable".to_string());
        let (worker, _dir) = worker_with(extractor);

        worker.start("https://x/watch?v=nope".to_string(), "t".to_string(), "best".to_string())
            .await
            .unwrap();

        let task = worker.store().get("t").unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.error.as_deref(), Some("ERROR: [youtube] nope: Video unavailable"));
        assert!(task.download.is_none());
    }

    #[tokio::test]
    async fn test_missing_output_is_an_error() {
        let mut extractor = FakeExtractor::ok("Ghost");
        extractor.write_file = false;
        let (worker, dir) = worker_with(extractor);

        worker.start("https://x/watch?v=ghost".to_string(), "t".to_string(), "best".to_string())
            .await
            .unwrap();

        let task = worker.store().get("t").unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        let expected = dir.path().join("ghost.mp4");
        assert_eq!(
            task.error.unwrap(),
            format!("Downloaded file not found at {}", expected.display())
        );
    }

    #[tokio::test]
    async fn test_other_container_is_located() {
        let mut extractor = FakeExtractor::ok("Web M");
        extractor.ext = "webm";
        let (worker, _dir) = worker_with(extractor);

        worker.start("https://x/watch?v=wb1".to_string(), "t".to_string(), "best".to_string())
            .await
            .unwrap();

        let download = worker.store().get("t").unwrap().download.unwrap();
        assert_eq!(download.filename, "Web_M_wb1.webm");
        assert_eq!(download.mime_type, "video/webm");
    }

    #[tokio::test]
    async fn test_rename_failure_keeps_temp_name() {
        let (worker, dir) = worker_with(FakeExtractor::ok("Blocked"));
        // A directory at the target path makes the rename fail
        std::fs::create_dir(dir.path().join("Blocked_blk1.mp4")).unwrap();

        worker.start("https://x/watch?v=blk1".to_string(), "t".to_string(), "best".to_string())
            .await
            .unwrap();

        let task = worker.store().get("t").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        let download = task.download.unwrap();
        assert_eq!(download.filename, "blk1.mp4");
        assert_eq!(download.file_path, "/static/videos/blk1.mp4");
    }

    #[tokio::test]
    async fn test_missing_title_uses_fallback() {
        let mut extractor = FakeExtractor::ok("");
        extractor.title = None;
        let (worker, _dir) = worker_with(extractor);

        worker.start("https://x/watch?v=nt1".to_string(), "t".to_string(), "best".to_string())
            .await
            .unwrap();

        let download = worker.store().get("t").unwrap().download.unwrap();
        assert_eq!(download.filename, "video_nt1.mp4");
    }

    #[tokio::test]
    async fn test_concurrent_downloads_do_not_interfere() {
        let (worker, _dir) = worker_with(FakeExtractor::ok("Same Title"));

        let mut handles = Vec::new();
        let mut ids = Vec::new();
        for n in 0..16 {
            let task_id = worker.store().next_id();
            ids.push((task_id.clone(), format!("vid{}", n)));
            handles.push(worker.start(
                format!("https://x/watch?v=vid{}", n),
                task_id,
                "best".to_string(),
            ));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let unique: HashSet<&String> = ids.iter().map(|(id, _)| id).collect();
        assert_eq!(unique.len(), 16);

        for (task_id, video_id) in &ids {
            let download = worker.store().get(task_id).unwrap().download.unwrap();
            assert_eq!(download.filename, format!("Same_Title_{}.mp4", video_id));
        }
        assert_eq!(worker.store().completed().len(), 16);
    }

    #[test]
    fn test_scan_for_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.part"), b"x").unwrap();
        std::fs::write(dir.path().join("abc.mkv.part"), b"x").unwrap();
        std::fs::write(dir.path().join("abc.info.json"), b"{}").unwrap();
        let expected = dir.path().join("abc.mp4");

        assert_eq!(scan_for_output(dir.path(), "abc", &expected), None);

        std::fs::write(dir.path().join("abc.mkv"), b"media").unwrap();
        assert_eq!(
            scan_for_output(dir.path(), "abc", &expected),
            Some(dir.path().join("abc.mkv"))
        );
    }

    #[test]
    fn test_public_path() {
        let settings = DownloadSettings {
            public_prefix: "/static/videos/".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.public_path("a.mp4"), "/static/videos/a.mp4");
    }
}
