//! HTTP surface: routing, handlers and the landing page

pub mod handlers;
pub mod page;

use crate::core::{DownloadWorker, FormatLister, TaskStore};
use crate::error::TubeError;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use page::render_index;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    pub worker: DownloadWorker,
    pub lister: FormatLister,
}

impl AppState {
    pub fn new(worker: DownloadWorker, lister: FormatLister) -> Self {
        Self {
            store: worker.store().clone(),
            worker,
            lister,
        }
    }
}

/// Build the application router; `static_dir` is served under `/static`
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/formats", get(handlers::formats))
        .route("/download", post(handlers::download))
        .route("/status/{task_id}", get(handlers::status))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), TubeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("Server stopped");
    Ok(())
}
