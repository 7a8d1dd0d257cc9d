use axum::{http::header, response::IntoResponse};

const MANIFEST: &str = include_str!("../../static/manifest.json");
const SERVICE_WORKER: &str = include_str!("../../static/service-worker.js");

pub async fn manifest() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/manifest+json")], MANIFEST)
}

/// Served from the root so the worker's scope covers the whole site.
pub async fn service_worker() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        SERVICE_WORKER,
    )
}
