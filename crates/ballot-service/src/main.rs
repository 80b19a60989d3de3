use ballot_service::{build_router, spawn_event_logger, ServiceConfig, ServiceState};
use clap::Parser;
use std::net::SocketAddr;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "ballotd", version, about = "Ballot election REST service")]
struct Cli {
    /// REST socket address to bind, e.g. 127.0.0.1:8095
    #[arg(long, default_value = "127.0.0.1:8095", env = "BALLOT_LISTEN")]
    listen: SocketAddr,
    /// Expose the administrator recovery endpoint that sets any workflow status.
    #[arg(long, default_value_t = false, env = "BALLOT_ALLOW_STATUS_OVERRIDE")]
    allow_status_override: bool,
    /// Capacity of the in-process event channel.
    #[arg(long, default_value_t = 256, env = "BALLOT_EVENT_BUFFER")]
    event_buffer: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "ballot_service=info,ballot_core=info".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig {
        allow_status_override: cli.allow_status_override,
        event_buffer: cli.event_buffer,
    };
    if config.allow_status_override {
        warn!("workflow status override endpoint is enabled");
    }

    let state = ServiceState::bootstrap(config);
    let event_logger = spawn_event_logger(&state);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!("ballot-service REST listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    event_logger.abort();
    Ok(())
}
