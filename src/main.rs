use std::env;

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certlink_server::{
    config::settings::{Config, LoggingConfig},
    error::Result,
    server::startup::start_server,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load();

    // Initialize structured logging
    init_tracing(&config.logging);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }

    info!("Starting certlink-server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: bind={}:{}, workers={}, public_base_url={}",
        config.server.host, config.server.port, config.server.worker_threads, config.server.public_base_url
    );

    match start_server(config).await {
        Ok(()) => {
            info!("Server shutdown completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Server failed: {}", e);
            Err(e)
        }
    }
}

/// `RUST_LOG` wins over `LOG_LEVEL`; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing(logging: &LoggingConfig) {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| format!("certlink_server={0},{0}", logging.level));

    let json_layer = logging.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
    });
    let compact_layer = (!logging.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&filter))
        .with(json_layer)
        .with(compact_layer)
        .init();

    info!("Structured logging initialized with filter: {}", filter);
}
