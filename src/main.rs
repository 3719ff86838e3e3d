//! Classroom points server.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use classroom_points::config::Config;
use classroom_points::rollover::SystemClock;
use classroom_points::{create_router, App};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting classroom participation tracker");
    tracing::info!("Data file: {:?}", config.data_file);
    tracing::info!("Bind address: {}", config.bind_addr);

    let bind_addr = config.bind_addr;
    let app = App::init(config, Arc::new(SystemClock)).await;

    let (classes, students) = app.state.repo.stats().await;
    tracing::info!("Classes loaded: {}", classes);
    tracing::info!("Total students: {}", students);

    let router = create_router(app.state.clone());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down server");
    app.shutdown().await;
    tracing::info!("Server shut down gracefully");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
