//! Main entry point for the tubedrop server

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tubedrop::cli::{Args, VerbosityLevel};
use tubedrop::core::{DownloadWorker, FormatLister, TaskStore};
use tubedrop::platform::{BrowserProfiles, CookieSource, Extractor, YtDlp};
use tubedrop::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();

    init_logging(args.verbosity_level())?;
    info!("Starting tubedrop with args: {:?}", args);

    let settings = args.download_settings();
    tokio::fs::create_dir_all(&settings.videos_dir).await?;
    info!("Videos directory: {}", settings.videos_dir.display());

    let extractor: Arc<dyn Extractor> = Arc::new(YtDlp::with_config(args.ytdlp_config()));
    let cookies: Arc<dyn CookieSource> = Arc::new(BrowserProfiles::new());
    let lister = FormatLister::new(extractor.clone(), cookies.clone(), settings.cookie_browser.clone());
    let worker = DownloadWorker::new(TaskStore::new(), extractor, cookies, settings);

    let app = server::router(AppState::new(worker, lister), &args.static_dir);

    let addr = args.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    print_banner(&args);

    server::serve(listener, app, shutdown_signal()).await?;
    Ok(())
}

/// Initialize logging
fn init_logging(verbosity: VerbosityLevel) -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG wins over the verbosity flags
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .compact())
        .try_init()?;

    Ok(())
}

fn print_banner(args: &Args) {
    let host = if args.host.is_unspecified() {
        "localhost".to_string()
    } else {
        args.host.to_string()
    };
    println!("\ntubedrop is running!");
    println!("Open http://{}:{} in your browser", host, args.port);
    println!("Press Ctrl+C to stop\n");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }
}
