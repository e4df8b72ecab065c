//! Serve command - runs the Silt server.

use std::{net::SocketAddr, sync::Arc};

use tokio::signal::unix::{SignalKind, signal};
use tracing_subscriber::EnvFilter;

use silt::{Engine, server, store::InMemory};

use crate::cli::{BackendKind, ServeArgs};

/// Run the Silt server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let level = match args.verbose {
        0 => "silt=info",
        1 => "silt=debug",
        _ => "silt=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse().unwrap()))
        .init();

    // Create the engine over the configured backend
    let engine = match args.backend {
        BackendKind::Sled => {
            let path = args.data_dir.join(&args.db_name);
            tracing::info!(path = %path.display(), "opening sled database");
            Engine::open_sled(path)?
        }
        BackendKind::Memory => {
            let path = args.data_dir.join(format!("{}.json", args.db_name));
            tracing::info!(path = %path.display(), "opening in-memory database");
            std::fs::create_dir_all(&args.data_dir)?;
            Engine::new(Box::new(InMemory::open(path)?))
        }
    };

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let handle = server::spawn(Arc::new(engine), addr, args.api_key.clone()).await?;

    println!("Silt server listening on http://{}", handle.addr());
    if args.api_key.is_some() {
        println!("API key required (x-api-key header)");
    }

    shutdown_signal().await;
    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::error!("failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
