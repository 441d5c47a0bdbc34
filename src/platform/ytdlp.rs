//! `yt-dlp` backed extractor

use crate::core::{Progress, ProgressSink, VideoInfo};
use crate::error::TubeError;
use crate::platform::cookies::CookieJar;
use crate::platform::extractor::{Extractor, FetchRequest};
use regex::Regex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::LazyLock;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Firefox 115 on Windows, the browser the cookies usually come from
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0";

const PROGRESS_MARKER: &str = "tubedrop-progress";
const STDERR_TAIL_LINES: usize = 50;

static PROGRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^tubedrop-progress\s+(\d+(?:\.\d+)?|NA|None)\s+(\d+(?:\.\d+)?|NA|None)\s*$")
        .expect("valid regex")
});

/// yt-dlp configuration
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Path of the yt-dlp executable
    pub binary: PathBuf,
    /// User-Agent header
    pub user_agent: String,
    /// Extra HTTP headers sent with every request
    pub headers: Vec<(String, String)>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: vec![
                (
                    "Accept".to_string(),
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                        .to_string(),
                ),
                ("Accept-Language".to_string(), "en-US,en;q=0.5".to_string()),
                ("Connection".to_string(), "keep-alive".to_string()),
            ],
        }
    }
}

/// Extractor driving the `yt-dlp` command line tool
#[derive(Debug, Clone, Default)]
pub struct YtDlp {
    config: YtDlpConfig,
}

impl YtDlp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Set executable path
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.config.binary = binary.into();
        self
    }

    /// Set User-Agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Arguments shared by probing and downloading
    fn common_args(&self, cookies: Option<&CookieJar>) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--user-agent".to_string(),
            self.config.user_agent.clone(),
        ];
        for (name, value) in &self.config.headers {
            args.push("--add-header".to_string());
            args.push(format!("{}:{}", name, value));
        }
        if let Some(jar) = cookies {
            args.push("--cookies-from-browser".to_string());
            args.push(jar.browser_arg());
        }
        args
    }

    fn probe_args(&self, url: &str, cookies: Option<&CookieJar>) -> Vec<String> {
        let mut args = vec!["-J".to_string(), "--no-warnings".to_string()];
        args.extend(self.common_args(cookies));
        args.push(url.to_string());
        args
    }

    fn fetch_args(&self, request: &FetchRequest<'_>) -> Vec<String> {
        let template = request.output_dir.join("%(id)s.%(ext)s");
        let mut args = vec![
            "-f".to_string(),
            request.format_selector.to_string(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--dump-json".to_string(),
            "--no-simulate".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{} %(progress.downloaded_bytes)s %(progress.total_bytes)s",
                PROGRESS_MARKER
            ),
        ];
        args.extend(self.common_args(request.cookies));
        args.push(request.url.to_string());
        args
    }

    fn command(&self, args: &[String]) -> Command {
        debug!("Running {} {}", self.config.binary.display(), args.join(" "));
        let mut command = Command::new(&self.config.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn unavailable(&self, e: std::io::Error) -> TubeError {
        TubeError::ExtractorUnavailable(format!("{}: {}", self.config.binary.display(), e))
    }
}

#[async_trait::async_trait]
impl Extractor for YtDlp {
    async fn probe(&self, url: &str, cookies: Option<&CookieJar>) -> Result<VideoInfo, TubeError> {
        let output = self
            .command(&self.probe_args(url, cookies))
            .output()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<String> = stderr.lines().map(str::to_string).collect();
            return Err(TubeError::Extraction(error_message(&lines, output.status)));
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        debug!("Probed {} with {} formats", info.id, info.formats.len());
        Ok(info)
    }

    async fn fetch(
        &self,
        request: FetchRequest<'_>,
        progress: ProgressSink,
    ) -> Result<VideoInfo, TubeError> {
        let mut child = self
            .command(&self.fetch_args(&request))
            .spawn()
            .map_err(|e| self.unavailable(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TubeError::Generic("yt-dlp stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TubeError::Generic("yt-dlp stderr not captured".to_string()))?;

        let (stdout_result, stderr_result) = tokio::join!(
            read_output(stdout, progress.clone(), true),
            read_output(stderr, progress, false)
        );
        let status = child.wait().await?;
        let stdout_lines = stdout_result?;
        let stderr_lines = stderr_result?;

        if !status.success() {
            return Err(TubeError::Download(error_message(&stderr_lines, status)));
        }

        let info_line = stdout_lines
            .iter()
            .rev()
            .find(|line| line.starts_with('{'))
            .ok_or_else(|| {
                TubeError::Download("yt-dlp finished without reporting video metadata".to_string())
            })?;
        let info: VideoInfo = serde_json::from_str(info_line)?;
        info!("yt-dlp finished downloading {}", info.id);
        Ok(info)
    }
}

// Forward progress lines to the sink and keep the tail of everything else.
// Lines are decoded lossily; yt-dlp may print in the console's locale encoding.
async fn read_output<R>(
    reader: R,
    progress: ProgressSink,
    keep_json: bool,
) -> std::io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut tail = VecDeque::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']).to_string();

        if let Some(event) = parse_progress_line(&line) {
            progress(event);
            continue;
        }
        if keep_json {
            if line.starts_with('{') {
                tail.push_back(line);
            } else {
                debug!("yt-dlp: {}", line);
            }
            continue;
        }
        debug!("yt-dlp: {}", line);
        tail.push_back(line);
        if tail.len() > STDERR_TAIL_LINES {
            tail.pop_front();
        }
    }

    Ok(tail.into())
}

/// Parse a line printed by the progress template
pub fn parse_progress_line(line: &str) -> Option<Progress> {
    let caps = PROGRESS_LINE.captures(line.trim())?;
    let downloaded = parse_byte_count(caps.get(1)?.as_str())?;
    let total = parse_byte_count(caps.get(2)?.as_str());
    Some(Progress::new(downloaded, total))
}

fn parse_byte_count(value: &str) -> Option<u64> {
    value.parse::<f64>().ok().map(|v| v as u64)
}

/// Pick the most useful message from yt-dlp's stderr
pub fn error_message(stderr_lines: &[String], status: ExitStatus) -> String {
    stderr_lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| stderr_lines.iter().rev().find(|line| !line.trim().is_empty()))
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| format!("yt-dlp exited with {}", status))
}
