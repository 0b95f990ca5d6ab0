use anyhow::{Context, Result};
use clap::Parser;
use syncwatch::{create_router, AppState, Config, Relay};
use tracing::info;

/// Watch-session synchronization relay
#[derive(Debug, Parser)]
#[command(name = "syncwatch", version, about)]
struct Args {
    /// Config file path (extension optional; missing file means defaults)
    #[arg(short, long, default_value = "config/syncwatch")]
    config: String,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt().with_max_level(args.log_level).init();

    let mut cfg = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Relay: history_limit={}, send_queue={}, ping={}s",
        cfg.relay.history_limit, cfg.relay.send_queue_capacity, cfg.relay.ping_interval_secs
    );

    let (relay, coordinator) = Relay::spawn(&cfg.relay);
    let state = AppState::new(relay, cfg.relay.ping_interval());
    let router = create_router(state, &cfg.cors);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Upgraded sockets may still hold relay handles; nothing is persisted, so stop outright.
    coordinator.abort();
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
