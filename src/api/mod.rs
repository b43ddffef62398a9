//! HTTP API server for the murmur gateway

pub mod chat;
pub mod health;

use std::path::PathBuf;
use std::sync::Arc;

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::upstream::ChatBackend;
use crate::Result;

/// The embedded browser voice UI
const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Shared state for API handlers
///
/// Everything here is immutable after startup; requests share it read-only.
#[derive(Clone)]
pub struct ApiState {
    /// Upstream chat-completion backend
    pub backend: Arc<dyn ChatBackend>,

    /// Conversation memory length in user+assistant pairs
    pub max_turns: usize,

    /// System prompt prepended to every upstream call
    pub system_prompt: String,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Create an API server from configuration and a backend
    #[must_use]
    pub fn new(
        config: &Config,
        backend: Arc<dyn ChatBackend>,
        port: u16,
        static_dir: Option<PathBuf>,
    ) -> Self {
        let state = Arc::new(ApiState {
            backend,
            max_turns: config.max_turns,
            system_prompt: config.system_prompt.clone(),
        });

        Self {
            state,
            port,
            static_dir,
        }
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(chat::router(self.state.clone()))
            .merge(health::router())
            .merge(health::upstream_router(self.state.clone()));

        // Serve the web UI: embedded page by default, directory override for
        // custom frontends
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        } else {
            router = router.route("/", get(index));
        }

        // CORS layer for cross-origin requests from frontends
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or serve
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Server(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Server(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// Serve the embedded single-page voice UI
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
