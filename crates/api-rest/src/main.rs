use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, serve, AppState};
use veritas_core::CoreConfig;

/// Main entry point for the Veritas REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
/// Provides the verdict, submission and upload endpoints with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `VERITAS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `VERITAS_CONFIG`: Optional YAML file overriding timings and attachment limits
///
/// # Returns
/// * `Ok(())` - If server starts and runs successfully
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration file cannot be read or parsed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("VERITAS_CONFIG").ok().map(PathBuf::from);
    let cfg = CoreConfig::load(config_path.as_deref())?;

    let addr = std::env::var("VERITAS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting Veritas REST API on {}", addr);

    serve(&addr, router(AppState::new(cfg))).await
}
