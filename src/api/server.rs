use std::net::SocketAddr;
use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api::handlers::{create_transfer, health_check, start_download, start_upload, transfer_status};
use crate::config::{Config, Mode};
use crate::session::SessionRegistry;
use crate::utils::error::{RelayError, Result};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub registry: SessionRegistry,
}

/// Assemble the router and start serving on the configured bind address.
pub async fn start_api_server(config: &Config, registry: SessionRegistry) -> Result<JoinHandle<()>> {
    let state = ApiState { registry };

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/api/create", post(create_transfer))
        .route("/api/status", get(transfer_status))
        .route("/u/{id}", post(start_upload))
        .route("/d/{id}", get(start_download));

    if config.server.mode == Mode::Dev {
        let asset_dir = config.server.asset_dir.clone();
        if Path::new(&asset_dir).exists() {
            info!(asset_dir = %asset_dir, "dev mode: serving static assets");
            let index_path = Path::new(&asset_dir).join("index.html");
            app = app
                .route(
                    "/",
                    get({
                        let index_path = index_path.clone();
                        move || serve_index(index_path.clone())
                    }),
                )
                .fallback_service(ServeDir::new(asset_dir));
        } else {
            warn!(asset_dir = %asset_dir, "dev mode enabled but asset directory not found");
        }
    }

    // Transfers are streamed, not buffered, so the default per-request cap
    // (meant for JSON API bodies) does not apply to uploads.
    let app = app
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.bind_port)
        .parse()
        .map_err(|e| RelayError::Config(format!("invalid bind address: {e}")))?;

    let listener = TcpListener::bind(&addr).await?;
    info!("filerelay listening on http://{}", addr);

    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("API server error: {}", err);
        }
    });

    Ok(handle)
}

async fn serve_index(index_path: std::path::PathBuf) -> Result<Html<String>, StatusCode> {
    tokio::fs::read_to_string(&index_path)
        .await
        .map(Html)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
