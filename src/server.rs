use crate::config::Config;
use crate::error::Result;
use crate::storage::Storage;
use crate::web::{app_router, AppState};
use axum::{http::Method, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the HTTP application
pub fn create_server(storage: Arc<dyn Storage>, config: Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    app_router(AppState::new(storage, config)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

/// Start the HTTP server on the configured address
pub async fn start_server(storage: Arc<dyn Storage>, config: Config) -> Result<()> {
    let address = config.bind_address();
    let port = config.server.port;
    let app = create_server(storage, config);

    let listener = TcpListener::bind(&address).await?;
    info!("HTTP server listening on {}", address);
    println!("🚀 Hi Academy running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("🔐 Back office:  http://localhost:{port}/admin");

    axum::serve(listener, app).await?;
    Ok(())
}
