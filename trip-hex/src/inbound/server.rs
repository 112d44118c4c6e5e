//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use trip_types::{RateSource, TripRepository};

use super::handlers::{self, AppState};
use crate::TripService;

/// HTTP Server for the trip ledger API.
pub struct HttpServer<R: TripRepository, S: RateSource> {
    state: Arc<AppState<R, S>>,
}

impl<R: TripRepository, S: RateSource> HttpServer<R, S> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: TripService<R, S>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
        }
    }

    pub fn service(&self) -> &TripService<R, S> {
        &self.state.service
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/status", get(handlers::status::<R, S>))
            .route(
                "/api/trips",
                post(handlers::create_trip::<R, S>).get(handlers::list_trips::<R, S>),
            )
            .route(
                "/api/trips/{id}",
                get(handlers::get_trip::<R, S>).delete(handlers::delete_trip::<R, S>),
            )
            .route("/api/trips/{id}/save", post(handlers::save_trip::<R, S>))
            .route("/api/trips/{id}/load", post(handlers::load_trip::<R, S>))
            .route(
                "/api/trips/{id}/travelers",
                post(handlers::add_traveler::<R, S>).get(handlers::list_travelers::<R, S>),
            )
            .route(
                "/api/trips/{id}/travelers/{name}",
                delete(handlers::remove_traveler::<R, S>),
            )
            .route(
                "/api/trips/{id}/expenses",
                post(handlers::add_expense::<R, S>).get(handlers::list_expenses::<R, S>),
            )
            .route(
                "/api/trips/{id}/expenses/{expense_id}",
                delete(handlers::delete_expense::<R, S>),
            )
            .route(
                "/api/trips/{id}/reports/summary",
                get(handlers::summary_report::<R, S>),
            )
            .route(
                "/api/trips/{id}/reports/categories",
                get(handlers::category_report::<R, S>),
            )
            .route(
                "/api/trips/{id}/reports/people",
                get(handlers::people_report::<R, S>),
            )
            .route(
                "/api/trips/{id}/reports/daily",
                get(handlers::daily_report::<R, S>),
            )
            .route(
                "/api/trips/{id}/reports/split",
                get(handlers::split_report::<R, S>),
            )
            .route("/api/convert", post(handlers::convert::<R, S>))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
