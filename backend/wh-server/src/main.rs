//! wh-server - minimal health and webhook server
//!
//! Prints `Server running on port <port>` to stdout once the listener is
//! bound; that line is the readiness marker the harness waits for.

use wh_config::{Config, logger};
use wh_server::{AppState, ServerError, ServerResult, build_router};

use std::io::Write;

use log::{error, info};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ServerResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let log_file_path = config.log_file_path()?;
    logger::initialize(config.logging.level, log_file_path, config.logging.colored)?;

    info!("Starting wh-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();
    if config.webhook.secret.is_some() {
        info!("Webhook signature verification enabled");
    }

    let app = build_router(AppState::from_config(&config));

    let bind_addr = config.server.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;
    let actual_addr = listener.local_addr()?;
    info!("Server listening on {actual_addr}");

    let mut stdout = std::io::stdout();
    writeln!(stdout, "Server running on port {}", actual_addr.port())?;
    stdout.flush()?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
