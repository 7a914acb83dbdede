mod dataset;

use std::path::{Path, PathBuf};

use axum::http::HeaderValue;
use axum::{response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use dataset::Dataset;

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
/// The data document is edited by hand, so browsers always revalidate it.
const CACHE_REVALIDATE: &str = "no-cache";

#[derive(Debug, Clone)]
struct ServerConfig {
    port: String,
    dist_dir: PathBuf,
    data_dir: PathBuf,
}

impl ServerConfig {
    fn from_env() -> Self {
        let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.to_string());
        Self {
            port: var("PORT", "3000"),
            dist_dir: PathBuf::from(var("DIST_DIR", "dist")),
            data_dir: PathBuf::from(var("DATA_DIR", "data")),
        }
    }
}

/// Build the full application router.
fn build_app(config: &ServerConfig) -> Router {
    let index_path = config.dist_dir.join("index.html");

    Router::new()
        .route("/", get(move || serve_index(index_path)))
        .nest(
            "/data",
            cached_static_router(&config.data_dir, CACHE_REVALIDATE),
        )
        .nest(
            "/assets",
            cached_static_router(&config.dist_dir.join("assets"), CACHE_IMMUTABLE),
        )
        .merge(cached_static_router(&config.dist_dir, CACHE_1DAY))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();

    // A broken document is reported but still served; the page shows the error.
    match Dataset::load(&config.data_dir) {
        Ok(dataset) => tracing::info!(
            composers = dataset.composers,
            studios = dataset.studios,
            routes = dataset.routes,
            "Validated atlas document"
        ),
        Err(err) => tracing::error!(%err, "Atlas document is not usable"),
    }

    let app = build_app(&config);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running at http://localhost:{}", config.port);
    axum::serve(listener, app).await
}

async fn serve_index(path: PathBuf) -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Composer Atlas</title></head>
<body>
<h1>Composer Atlas</h1>
<p>Frontend not built yet. Run <code>dx build</code> in crates/frontend and point DIST_DIR at its output.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}
