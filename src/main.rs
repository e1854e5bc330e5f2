use std::path::PathBuf;

use axum::Router;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, serve, AppState};
use veritas_core::CoreConfig;

/// Mounts the pages in `asset_dir`, if any, behind the API routes.
fn app(state: AppState, asset_dir: Option<PathBuf>) -> Router {
    let api = router(state);
    match asset_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    }
}

/// Main entry point for the Veritas application
///
/// Starts the REST API and, when an asset directory is configured, serves the form,
/// loading and results pages from it on the same address.
///
/// # Environment Variables
/// - `VERITAS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `VERITAS_CONFIG`: Optional YAML file overriding timings and attachment limits
/// - `VERITAS_ASSET_DIR`: Directory of static pages and the loading video
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("veritas_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("VERITAS_CONFIG").ok().map(PathBuf::from);
    let cfg = CoreConfig::load(config_path.as_deref())?;
    let asset_dir = std::env::var("VERITAS_ASSET_DIR").ok().map(PathBuf::from);
    let addr = std::env::var("VERITAS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting Veritas on {}", addr);
    if let Some(dir) = &asset_dir {
        tracing::info!("++ Serving pages from {}", dir.display());
    }

    serve(&addr, app(AppState::new(cfg), asset_dir)).await
}
