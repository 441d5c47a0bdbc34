//! Command line argument parsing

use crate::core::{DownloadSettings, DEFAULT_PUBLIC_PREFIX};
use crate::platform::{YtDlpConfig, DEFAULT_USER_AGENT};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// tubedrop - local web front-end for downloading videos as MP4 files
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to bind
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "8001")]
    pub port: u16,

    /// Directory served under /static; downloads go to its videos/ subdirectory
    #[arg(long, value_name = "DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Path of the yt-dlp executable
    #[arg(long = "yt-dlp", value_name = "PATH", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// Browser whose cookies are passed to yt-dlp
    #[arg(long, value_name = "BROWSER", default_value = "firefox")]
    pub cookies_from_browser: String,

    /// Never look up browser cookies
    #[arg(long)]
    pub no_cookies: bool,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only warnings and errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Socket address the server binds to
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Directory downloads are written to
    pub fn videos_dir(&self) -> PathBuf {
        self.static_dir.join("videos")
    }

    /// Browser to read cookies from, unless disabled
    pub fn cookie_browser(&self) -> Option<String> {
        let browser = self.cookies_from_browser.trim();
        if self.no_cookies || browser.is_empty() {
            None
        } else {
            Some(browser.to_string())
        }
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            videos_dir: self.videos_dir(),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            cookie_browser: self.cookie_browser(),
        }
    }

    pub fn ytdlp_config(&self) -> YtDlpConfig {
        let mut config = YtDlpConfig {
            binary: self.yt_dlp.clone(),
            ..Default::default()
        };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (warnings and errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

impl VerbosityLevel {
    /// Log filter used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "warn",
            VerbosityLevel::Normal => "info,tower_http=info",
            VerbosityLevel::Verbose => "debug,tower_http=debug",
        }
    }
}

impl Default for Args {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8001,
            static_dir: PathBuf::from("static"),
            yt_dlp: PathBuf::from("yt-dlp"),
            cookies_from_browser: "firefox".to_string(),
            no_cookies: false,
            user_agent: None,
            verbose: false,
            quiet: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::default();
        assert_eq!(args.bind_addr().to_string(), "0.0.0.0:8001");
        assert_eq!(args.videos_dir(), PathBuf::from("static").join("videos"));
        assert_eq!(args.cookie_browser(), Some("firefox".to_string()));
        assert_eq!(args.verbose, false);
        assert_eq!(args.quiet, false);
    }

    #[test]
    fn test_parsed_defaults_match_default() {
        let args = Args::parse_from(["tubedrop"]);
        assert_eq!(args, Args::default());
    }

    #[test]
    fn test_args_custom_values() {
        let args = Args::parse_from([
            "tubedrop",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
            "--static-dir",
            "/srv/www",
            "--yt-dlp",
            "/opt/bin/yt-dlp",
            "--no-cookies",
            "--user-agent",
            "agent/2.0",
            "-v",
        ]);

        assert_eq!(args.bind_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(args.cookie_browser(), None);
        assert_eq!(args.verbosity_level(), VerbosityLevel::Verbose);

        let settings = args.download_settings();
        assert_eq!(settings.videos_dir, PathBuf::from("/srv/www/videos"));
        assert_eq!(settings.public_prefix, "/static/videos");
        assert_eq!(settings.cookie_browser, None);

        let config = args.ytdlp_config();
        assert_eq!(config.binary, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(config.user_agent, "agent/2.0");
    }

    #[test]
    fn test_ytdlp_config_keeps_default_agent() {
        let config = Args::default().ytdlp_config();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(!config.headers.is_empty());
    }

    #[test]
    fn test_args_verbosity_level() {
        let args = Args {
            quiet: true,
            verbose: true,
            ..Default::default()
        };
        assert_eq!(args.verbosity_level(), VerbosityLevel::Quiet);
        assert_eq!(args.verbosity_level().log_filter(), "warn");
        assert_eq!(Args::default().verbosity_level(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_blank_browser_disables_cookies() {
        let args = Args {
            cookies_from_browser: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(args.cookie_browser(), None);
    }
}
