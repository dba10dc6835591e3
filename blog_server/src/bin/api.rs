use std::time::Duration;

use anyhow::Context;
use blog_core::server::{Server, ServerHandle, ShutdownMode};
use blog_core::{build_application_state, run};
use blog_server::configuration::Config;
use blog_server::telemetry::{get_subscriber, init_telemetry};
use tracing_log_error::log_error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("info", std::io::stdout);
    init_telemetry(subscriber)?;

    // All the setup and launch logic lives in `_main`, giving us a single
    // place to log the fatal errors that cause the application to exit.
    if let Err(e) = _main().await {
        log_error!(*e, "The application is exiting due to an error");
    }

    Ok(())
}

async fn _main() -> anyhow::Result<()> {
    let config = Config::load(None)?;
    let application_state = build_application_state(&config.app)
        .await
        .context("Failed to build the application state")?;

    let tcp_listener = config
        .server
        .listener()
        .await
        .context("Failed to bind the server TCP listener")?;
    let address = tcp_listener
        .local_addr()
        .context("The server TCP listener doesn't have a local socket address")?;
    let server_builder = Server::new().listen(tcp_listener);
    let shutdown_timeout = config.server.graceful_shutdown_timeout;

    tracing::info!("Starting to listen for incoming requests at {}", address);
    let server_handle = run(server_builder, application_state);
    graceful_shutdown(server_handle.clone(), shutdown_timeout);
    server_handle.await;
    Ok(())
}

fn graceful_shutdown(server_handle: ServerHandle, timeout: Duration) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error!(e, "Failed to listen for the Ctrl+C signal");
            return;
        }
        tracing::info!("Shutting down, waiting up to {:?} for open connections", timeout);
        server_handle
            .shutdown(ShutdownMode::Graceful { timeout })
            .await;
    });
}
