//! Navkit server binary.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use navkit_kernel::{AppState, Config, routes, session};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting navkit kernel");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        port = config.port,
        route_list_scope = ?config.route_list_scope,
        "Configuration loaded"
    );

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    info!(modules = state.modules().len(), "Database connection established");

    let session_layer = session::create_session_layer(
        &config.redis_url,
        session::parse_same_site(&config.cookie_same_site),
    )
    .await
    .context("failed to create session layer")?;

    // Middleware layers (last added = first executed in request flow):
    // TraceLayer → timeout → session → principal → routes
    #[allow(deprecated)]
    let timeout = TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs));
    let app = routes::app(state)
        .layer(session_layer)
        .layer(timeout)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
