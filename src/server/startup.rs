use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware, App, HttpServer};
use tokio::signal;
use tracing::{error, info, instrument};

use crate::{
    config::{constants::DEFAULT_CORS_MAX_AGE_SECS, settings::Config},
    error::{AppError, Result},
    server::{
        app_state::AppState,
        http::{configure_app_data, configure_routes},
    },
    storage::init_storage,
};

/// Initialize storage and serve until a shutdown signal arrives
#[instrument(skip(config))]
pub async fn start_server(config: Config) -> Result<()> {
    let storage = init_storage(&config.database).await?;
    let state = AppState::new(config, storage);

    let http_server = start_http_server(state.clone());
    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        result = http_server => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
                return Err(e);
            }
        },
        _ = shutdown_signal => {
            info!("Shutdown signal received");
        }
    }

    graceful_shutdown(state).await;
    info!("Server shutdown completed");
    Ok(())
}

/// Build and run the actix HTTP server
#[instrument(skip(state))]
async fn start_http_server(state: AppState) -> Result<()> {
    let server_config = state.config.server.clone();
    let addr = server_config.address()?;

    info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .configure(configure_app_data(state.clone()))
            // Middleware stack
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
                    .add(("X-Content-Type-Options", "nosniff")),
            )
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(DEFAULT_CORS_MAX_AGE_SECS),
            )
            .configure(configure_routes)
    })
    .workers(server_config.worker_threads)
    .keep_alive(Duration::from_secs(75))
    .client_request_timeout(Duration::from_secs(60))
    .shutdown_timeout(30)
    .bind(addr)
    .map_err(|e| AppError::Internal(format!("Failed to bind HTTP server: {}", e)))?
    .run()
    .await
    .map_err(|e| AppError::Internal(format!("HTTP server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}

/// Setup graceful shutdown signal handling
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received TERM signal, initiating graceful shutdown...");
        },
    }
}

/// Close storage connections
async fn graceful_shutdown(state: AppState) {
    if let Err(e) = state.storage.close().await {
        error!("Error closing storage connections: {}", e);
    }
}
