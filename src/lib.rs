//! Classroom participation tracker.
//!
//! Per-class rosters with 0-20 point counts, persisted to a JSON snapshot and
//! synchronized across devices by broadcasting every mutation over a WebSocket
//! event channel.

pub mod api;
pub mod broadcast;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod persistence;
pub mod rollover;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use broadcast::Hub;
use config::Config;
use persistence::SaveTrigger;
use rollover::Clock;
use store::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub hub: Arc<Hub>,
    pub config: Arc<Config>,
}

/// Running services: the shared state plus the background sidecars.
pub struct App {
    pub state: AppState,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Restore the store, run the startup rollover and start the persistence
    /// and rollover sidecars.
    pub async fn init(config: Config, clock: Arc<dyn Clock>) -> Self {
        let (store, needs_save) =
            persistence::init_store(&config.data_file, config.seed_sample, clock.as_ref()).await;

        let hub = Arc::new(Hub::new());
        let saver = Arc::new(SaveTrigger::new());
        let repo = Arc::new(Repository::new(
            store,
            Arc::clone(&hub),
            Arc::clone(&saver),
            clock,
        ));

        if needs_save {
            persistence::flush(&repo, &config.data_file).await;
        }

        let rolled = repo.run_rollover().await;
        if !rolled.is_empty() {
            tracing::info!("Startup rollover applied to {} classes", rolled.len());
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let tasks = vec![
            persistence::spawn_persistence(
                Arc::clone(&repo),
                saver,
                config.data_file.clone(),
                config.save_interval,
                shutdown_rx.clone(),
            ),
            rollover::spawn_rollover(Arc::clone(&repo), config.rollover_interval, shutdown_rx),
        ];

        Self {
            state: AppState {
                repo,
                hub,
                config: Arc::new(config),
            },
            shutdown,
            tasks,
        }
    }

    /// Stop the sidecars; the persistence sidecar writes a final snapshot first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("Background task failed: {}", e);
            }
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(api::health))
        // Classes
        .route("/classes", get(api::list_classes).post(api::create_class))
        .route("/classes/{class_name}", axum::routing::delete(api::delete_class))
        .route("/classes/{class_name}/history", get(api::class_history))
        .route("/classes/{class_name}/reset-week", post(api::reset_week))
        .route("/classes/{class_name}/all-points", post(api::adjust_all_points))
        // Students
        .route(
            "/classes/{class_name}/students",
            get(api::list_students).post(api::add_student),
        )
        .route(
            "/classes/{class_name}/students/{student_id}",
            put(api::update_student).delete(api::delete_student),
        )
        .route(
            "/classes/{class_name}/students/{student_id}/points",
            put(api::update_points),
        )
        // Event channel
        .route("/events", get(broadcast::events_ws));

    // Liveness probe
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
