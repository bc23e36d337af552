//! Static file serving and asset management.

use axum::{
    handler::HandlerWithoutStateExt,
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

/// Client script bundled into the binary.
pub const SHELL_JS: &str = include_str!("../static/shell.js");

/// Base stylesheet bundled into the binary.
pub const SHELL_CSS: &str = include_str!("../static/shell.css");

/// Routes for the bundled script and stylesheet.
pub fn bundled_assets() -> Router {
    Router::new()
        .route("/shell.js", get(shell_js))
        .route("/shell.css", get(shell_css))
}

async fn shell_js() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        SHELL_JS,
    )
}

async fn shell_css() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        SHELL_CSS,
    )
}

/// Serve branding assets (logos, favicons) from `assets_dir` under `prefix`.
pub fn nest_static_files<S>(router: Router<S>, prefix: &str, assets_dir: &Path) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let serve_dir = ServeDir::new(assets_dir).not_found_service(handle_404.into_service());
    router.nest_service(prefix, serve_dir)
}

async fn handle_404(uri: Uri) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("No asset at {}", uri.path()),
    )
}
