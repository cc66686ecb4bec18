//! PageRelay — converts pages to Markdown through a connected browser.

use std::sync::Arc;

use pagerelay_core::RelayConfig;
use pagerelay_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_help() {
    println!("PageRelay — fetch pages through a browser extension and return Markdown");
    println!();
    println!("Usage: pagerelay [--addr <host:port>]");
    println!();
    println!("Options:");
    println!("  --addr <host:port>       Listen address (default: PAGERELAY_ADDR or 0.0.0.0:8000)");
    println!("  help                     Show this help message");
    println!();
    println!("Endpoints:");
    println!("  GET /convert?url=<url>&is_news=<bool>");
    println!("  GET /ws                  Browser extension socket");
    println!("  GET /status");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; DEBUG=true lowers the default level.
    let debug = std::env::var("DEBUG")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if debug { "debug" } else { "info" })
        }))
        .init();

    let mut config = RelayConfig::from_env();

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" => match args.get(i + 1) {
                Some(addr) => {
                    config.addr = addr.clone();
                    i += 2;
                }
                None => {
                    eprintln!("Usage: pagerelay --addr <host:port>");
                    std::process::exit(1);
                }
            },
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}. Use 'pagerelay help' for usage.", other);
                std::process::exit(1);
            }
        }
    }

    let addr = config.addr.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("PageRelay listening on {} (agents connect to /ws)", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
